//! Prompt-synchronised reads.
//!
//! An alternate request/response mode: instead of streaming whole lines, read
//! byte by byte until the remote shell prints its prompt. Every byte is also
//! forwarded to the log pipeline as its own line.

use std::io::{ErrorKind, Read};

use remote_build_core::{Error, Result};
use remote_build_view::LineCoalescer;

/// Trailing bytes that mark a remote shell prompt.
pub const PROMPT_SENTINEL: &str = "$ ";

/// Read until the output ends with [`PROMPT_SENTINEL`] and return everything read.
///
/// Fails with [`Error::StreamEnded`] if the stream closes first.
pub fn read_until_prompt<R: Read + ?Sized>(
    reader: &mut R,
    coalescer: &LineCoalescer,
) -> Result<String> {
    let mut buffer = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match reader.read(&mut byte) {
            Ok(0) => return Err(Error::StreamEnded),
            Ok(_) => {
                buffer.push(byte[0]);
                coalescer.feed(&format!("{}\n", String::from_utf8_lossy(&byte)));
                if buffer.ends_with(PROMPT_SENTINEL.as_bytes()) {
                    return Ok(String::from_utf8_lossy(&buffer).into_owned());
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => return Err(Error::StreamEnded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remote_build_core::ViewSettings;
    use remote_build_view::{render_channel, RenderCommand};
    use std::io::Cursor;
    use tokio::runtime::Runtime;

    #[test]
    fn test_stops_at_prompt() {
        let runtime = Runtime::new().unwrap();
        let (queue, _receiver) = render_channel();
        let coalescer = LineCoalescer::new(queue, runtime.handle().clone(), &ViewSettings::default());

        let mut reader = Cursor::new(b"welcome\ndev@box:~$ ls\n".to_vec());
        let output = read_until_prompt(&mut reader, &coalescer).unwrap();

        assert_eq!(output, "welcome\ndev@box:~$ ");
        assert_eq!(reader.position(), output.len() as u64);
    }

    #[test]
    fn test_each_byte_becomes_a_line() {
        let runtime = Runtime::new().unwrap();
        let (queue, mut receiver) = render_channel();
        let coalescer = LineCoalescer::new(queue, runtime.handle().clone(), &ViewSettings::default());

        let mut reader = Cursor::new(b"ab$ ".to_vec());
        read_until_prompt(&mut reader, &coalescer).unwrap();
        coalescer.flush();

        let mut text = String::new();
        while let Some(RenderCommand::AppendLines(batch)) = receiver.try_next() {
            text.push_str(&batch);
        }
        assert_eq!(text, "a\nb\n$\n \n");
    }

    #[test]
    fn test_eof_before_prompt() {
        let runtime = Runtime::new().unwrap();
        let (queue, _receiver) = render_channel();
        let coalescer = LineCoalescer::new(queue, runtime.handle().clone(), &ViewSettings::default());

        let mut reader = Cursor::new(b"no prompt here".to_vec());
        assert!(matches!(
            read_until_prompt(&mut reader, &coalescer),
            Err(Error::StreamEnded)
        ));
    }
}
