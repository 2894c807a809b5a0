use std::io::BufRead;
use std::str::FromStr;
use std::thread;

use futures::Stream;
use tokio::sync::mpsc;

use crate::error::Error;
use crate::filter::Filter;

const PENDING_LINES: usize = 16;

/// Line commands read from stdin while the wall runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetFilter(Filter),
    TogglePanel,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let first = words
            .next()
            .ok_or_else(|| Error::Command("empty line".into()))?
            .to_ascii_lowercase();

        let command = match first.as_str() {
            "panel" | "toggle" | "instructions" => Command::TogglePanel,
            "quit" | "exit" | "q" => Command::Quit,
            "filter" => {
                let value = words
                    .next()
                    .ok_or_else(|| Error::Command("filter needs a value".into()))?;
                Command::SetFilter(value.parse()?)
            }
            other => Command::SetFilter(other.parse()?),
        };

        match words.next() {
            Some(extra) => Err(Error::Command(format!("unexpected `{extra}`"))),
            None => Ok(command),
        }
    }
}

/// Reads lines on a plain thread and hands them to the runtime.
///
/// Blocking reads never live on the runtime, so shutting it down does not
/// wait for the next line. The thread ends at EOF, on a read error, or once
/// the stream is dropped and the next line arrives.
pub fn spawn_reader<R>(input: R) -> impl Stream<Item = String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(PENDING_LINES);

    thread::spawn(move || {
        for line in input.lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    tracing::warn!("controls closed: {e}");
                    return;
                }
            };
            if tx.blocking_send(line).is_err() {
                return;
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|line| (line, rx)) })
}

#[cfg(test)]
mod tests {
    use std::io::{self, BufReader, Cursor, Read};
    use std::time::{Duration, Instant};

    use futures::StreamExt;

    use super::*;
    use crate::post::Platform;

    /// Input that never delivers a byte, like an idle terminal.
    struct Stalled;

    impl Read for Stalled {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            loop {
                thread::park();
            }
        }
    }

    #[test]
    fn parse_commands() {
        assert_eq!("youtube".parse::<Command>().unwrap(), Command::SetFilter(Filter::Only(Platform::YouTube)));
        assert_eq!("filter All".parse::<Command>().unwrap(), Command::SetFilter(Filter::All));
        assert_eq!("  panel ".parse::<Command>().unwrap(), Command::TogglePanel);
        assert_eq!("quit".parse::<Command>().unwrap(), Command::Quit);
    }

    #[test]
    fn reject_garbage() {
        assert!("".parse::<Command>().is_err());
        assert!("filter".parse::<Command>().is_err());
        assert!("facebook".parse::<Command>().is_err());
        assert!("tiktok please".parse::<Command>().is_err());
    }

    #[tokio::test]
    async fn reader_yields_lines_until_eof() {
        let lines: Vec<String> = spawn_reader(Cursor::new("tiktok\n\npanel\nquit")).collect().await;
        assert_eq!(lines, ["tiktok", "", "panel", "quit"]);
    }

    #[test]
    fn idle_input_does_not_block_shutdown() {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let mut lines = Box::pin(spawn_reader(BufReader::new(Stalled)));

        let next = runtime.block_on(async { tokio::time::timeout(Duration::from_millis(50), lines.next()).await });
        assert!(next.is_err());

        let started = Instant::now();
        drop(lines);
        drop(runtime);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
