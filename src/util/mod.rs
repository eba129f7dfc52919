pub mod logger;

#[inline]
pub fn is_alphabetic(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

#[inline]
pub fn is_numeric(c: char) -> bool {
    c.is_ascii_digit()
}

#[inline]
pub fn is_alphanumeric(c: char) -> bool {
    is_alphabetic(c) || is_numeric(c)
}

/// Stack size of the thread programs run on. Deep enough for the interpreter's call limit
/// in an unoptimized build.
pub const INTERPRETER_STACK_SIZE: usize = 1024 * 1024 * 1024;

/// Runs `f` on a new thread with [`INTERPRETER_STACK_SIZE`] bytes of stack and waits for it.
/// A panic inside `f` is resumed on the calling thread.
pub fn with_interpreter_stack<T, F>(f: F) -> std::io::Result<T>
    where F: FnOnce() -> T + Send + 'static, T: Send + 'static {
    let handle = std::thread::Builder::new()
        .name(String::from("interpreter"))
        .stack_size(INTERPRETER_STACK_SIZE)
        .spawn(f)?;

    match handle.join() {
        Ok(result) => Ok(result),
        Err(panic) => std::panic::resume_unwind(panic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreter_stack_returns_result() {
        assert_eq!(with_interpreter_stack(|| 6 * 7).unwrap(), 42);
    }

    #[test]
    #[should_panic(expected = "inside")]
    fn interpreter_stack_resumes_panics() {
        let _ = with_interpreter_stack(|| panic!("inside"));
    }
}
