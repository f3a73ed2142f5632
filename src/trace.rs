//! Valgrind `lackey`-style memory traces.
//!
//! ```text
//! I 0400d7d4,8
//!  M 0421c7f0,4
//!  L 04f6b868,8
//!  S 7ff0005c8,8
//! ```
//!
//! Each record is an operation character, a hex address and a decimal size.
//! Lines that do not match are skipped, and instruction fetches never reach the cache.

use std::io::BufRead;

use log::debug;
use winnow::ascii::{digit1, hex_digit1, space0, space1};
use winnow::combinator::{alt, opt, preceded, separated_pair, terminated};
use winnow::{ModalResult, Parser};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessKind {
    Instruction,
    Load,
    Store,
    Modify,
}

impl AccessKind {
    /// Number of cache accesses one event of this kind expands to.
    pub fn accesses(self) -> usize {
        match self {
            AccessKind::Instruction => 0,
            AccessKind::Load | AccessKind::Store => 1,
            AccessKind::Modify => 2,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            AccessKind::Instruction => 'I',
            AccessKind::Load => 'L',
            AccessKind::Store => 'S',
            AccessKind::Modify => 'M',
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub kind: AccessKind,
    pub address: u64,
    /// Informational only, every event touches a single line.
    pub size: u32,
}

impl TraceEvent {
    pub fn new(kind: AccessKind, address: u64, size: u32) -> Self {
        Self {
            kind,
            address,
            size,
        }
    }

    pub fn is_data(&self) -> bool {
        self.kind != AccessKind::Instruction
    }
}

impl std::fmt::Display for TraceEvent {
    /// Formats the event as a trace line, data accesses indented by one space.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let indent = if self.is_data() { " " } else { "" };
        f.write_fmt(format_args!(
            "{indent}{} {:x},{}",
            self.kind.as_char(),
            self.address,
            self.size
        ))
    }
}

/// Parses one trace line, `None` if it is not a record.
pub fn parse_line(line: &str) -> Option<TraceEvent> {
    terminated(event, space0)
        .parse(line.trim_end_matches(['\n', '\r']))
        .ok()
}

/// Data events of an in-memory trace, in order.
pub fn data_events(trace: &str) -> impl Iterator<Item = TraceEvent> + '_ {
    trace
        .lines()
        .filter_map(parse_line)
        .filter(TraceEvent::is_data)
}

/// Streams the data events of a trace line by line.
#[derive(Debug)]
pub struct TraceReader<R> {
    lines: std::io::Split<R>,
    instructions: usize,
    skipped: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.split(b'\n'),
            instructions: 0,
            skipped: 0,
        }
    }

    /// Instruction fetches filtered out so far.
    pub fn instructions(&self) -> usize {
        self.instructions
    }

    /// Lines that were not trace records.
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = std::io::Result<TraceEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let bytes = match self.lines.next()? {
                Ok(bytes) => bytes,
                Err(e) => return Some(Err(e)),
            };

            match std::str::from_utf8(&bytes).ok().and_then(parse_line) {
                Some(event) if event.is_data() => return Some(Ok(event)),
                Some(_) => self.instructions += 1,
                None => {
                    if !bytes.trim_ascii().is_empty() {
                        debug!("skipping trace line {:?}", String::from_utf8_lossy(&bytes));
                    }
                    self.skipped += 1;
                }
            }
        }
    }
}

fn event(input: &mut &str) -> ModalResult<TraceEvent> {
    (
        preceded(space0, access_kind),
        preceded(space1, separated_pair(address, ',', size)),
    )
        .map(|(kind, (address, size))| TraceEvent {
            kind,
            address,
            size,
        })
        .parse_next(input)
}

fn access_kind(input: &mut &str) -> ModalResult<AccessKind> {
    alt((
        'I'.value(AccessKind::Instruction),
        'L'.value(AccessKind::Load),
        'S'.value(AccessKind::Store),
        'M'.value(AccessKind::Modify),
    ))
    .parse_next(input)
}

fn address(input: &mut &str) -> ModalResult<u64> {
    preceded(
        opt(alt(("0x", "0X"))),
        hex_digit1.try_map(|s| u64::from_str_radix(s, 16)),
    )
    .parse_next(input)
}

fn size(input: &mut &str) -> ModalResult<u32> {
    preceded(space0, digit1.try_map(str::parse::<u32>)).parse_next(input)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_each_record_kind() {
        assert_eq!(
            parse_line("I 0400d7d4,8"),
            Some(TraceEvent::new(AccessKind::Instruction, 0x0400d7d4, 8))
        );
        assert_eq!(
            parse_line(" L 7ff0005c8,8"),
            Some(TraceEvent::new(AccessKind::Load, 0x7ff0005c8, 8))
        );
        assert_eq!(
            parse_line(" S 10,1\r\n"),
            Some(TraceEvent::new(AccessKind::Store, 0x10, 1))
        );
        assert_eq!(
            parse_line(" M 0421c7f0,4  "),
            Some(TraceEvent::new(AccessKind::Modify, 0x0421c7f0, 4))
        );
    }

    #[test]
    fn accepts_hex_prefix_and_spaced_size() {
        assert_eq!(
            parse_line(" L 0x10,1"),
            Some(TraceEvent::new(AccessKind::Load, 0x10, 1))
        );
        assert_eq!(
            parse_line(" S 0XfF, 4"),
            Some(TraceEvent::new(AccessKind::Store, 0xff, 4))
        );
        assert_eq!(
            parse_line(" M 0,\t8"),
            Some(TraceEvent::new(AccessKind::Modify, 0, 8))
        );
    }

    #[test]
    fn rejects_non_records() {
        for line in [
            "",
            "==1234== lackey output",
            " X 10,1",
            " L10,1",
            " L zz,1",
            " L 10",
            " L 10,",
            " L 10 ,1",
            " L 0x,1",
            " L 10,1 trailing",
            " L 1ffffffffffffffff,1",
        ] {
            assert_eq!(parse_line(line), None, "{line:?}");
        }
    }

    #[test]
    fn display_matches_trace_format() {
        let events = [
            TraceEvent::new(AccessKind::Instruction, 0x400d7d4, 8),
            TraceEvent::new(AccessKind::Modify, 0x20, 1),
        ];

        assert_eq!(events[0].to_string(), "I 400d7d4,8");
        assert_eq!(events[1].to_string(), " M 20,1");
        for event in events {
            assert_eq!(parse_line(&event.to_string()), Some(event));
        }
    }

    #[test]
    fn reader_yields_data_events_only() {
        let trace = "I 0400d7d4,8\n M 0421c7f0,4\n\ngarbage\n L 04f6b868,8\n S 7ff0005c8,8";
        let mut reader = TraceReader::new(trace.as_bytes());

        let events = reader.by_ref().collect::<Result<Vec<_>, _>>().unwrap();

        assert_eq!(
            events,
            vec![
                TraceEvent::new(AccessKind::Modify, 0x0421c7f0, 4),
                TraceEvent::new(AccessKind::Load, 0x04f6b868, 8),
                TraceEvent::new(AccessKind::Store, 0x7ff0005c8, 8),
            ]
        );
        assert_eq!(reader.instructions(), 1);
        assert_eq!(reader.skipped(), 2);
        assert_eq!(data_events(trace).collect::<Vec<_>>(), events);
    }

    #[test]
    fn reader_skips_invalid_utf8() {
        let trace: &[u8] = b" L 10,1\n\xff\xfe\n S 20,1\n";
        let events = TraceReader::new(trace)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(events.len(), 2);
    }
}
