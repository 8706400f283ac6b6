use {
    super::*,
    tokio_util::{
        bytes::{Buf, BytesMut},
        codec::Decoder,
    },
};

/// One newline-terminated frame from a miner. Frames that are not UTF-8 or
/// exceed the length limit are reported instead of failing the stream, so
/// the connection can answer them and keep reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Text(String),
    NotUtf8,
    TooLong,
}

#[derive(Debug)]
pub(crate) struct MinerCodec {
    max_length: usize,
    next_index: usize,
    discarding: bool,
}

impl MinerCodec {
    pub(crate) fn new(max_length: usize) -> Self {
        Self {
            max_length,
            next_index: 0,
            discarding: false,
        }
    }
}

impl Decoder for MinerCodec {
    type Item = Line;
    type Error = io::Error;

    fn decode(&mut self, buf: &mut BytesMut) -> io::Result<Option<Line>> {
        loop {
            if self.discarding {
                return match buf.iter().position(|byte| *byte == b'\n') {
                    Some(index) => {
                        buf.advance(index + 1);
                        self.discarding = false;
                        Ok(Some(Line::TooLong))
                    }
                    None => {
                        buf.clear();
                        Ok(None)
                    }
                };
            }

            let read_to = buf.len().min(self.max_length.saturating_add(1));

            match buf[self.next_index..read_to]
                .iter()
                .position(|byte| *byte == b'\n')
            {
                Some(offset) => {
                    let frame = buf.split_to(self.next_index + offset + 1);
                    self.next_index = 0;
                    return Ok(Some(line(&frame[..frame.len() - 1])));
                }
                None if buf.len() > self.max_length => {
                    self.next_index = 0;
                    self.discarding = true;
                }
                None => {
                    self.next_index = read_to;
                    return Ok(None);
                }
            }
        }
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> io::Result<Option<Line>> {
        if let Some(line) = self.decode(buf)? {
            return Ok(Some(line));
        }

        self.next_index = 0;

        if buf.is_empty() || self.discarding {
            buf.clear();
            return Ok(None);
        }

        let frame = buf.split_to(buf.len());

        Ok(Some(line(&frame)))
    }
}

fn line(bytes: &[u8]) -> Line {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);

    match std::str::from_utf8(bytes) {
        Ok(text) => Line::Text(text.into()),
        Err(_) => Line::NotUtf8,
    }
}

#[cfg(test)]
mod tests {
    use {super::*, pretty_assertions::assert_eq};

    #[track_caller]
    fn case(max_length: usize, input: &[u8], expected: &[Line]) {
        let mut codec = MinerCodec::new(max_length);
        let mut buf = BytesMut::from(input);
        let mut lines = Vec::new();

        while let Some(line) = codec.decode_eof(&mut buf).unwrap() {
            lines.push(line);
        }

        assert_eq!(lines, expected);
        assert!(buf.is_empty());
    }

    fn text(s: &str) -> Line {
        Line::Text(s.into())
    }

    #[test]
    fn splits_lines() {
        case(16, b"a\nbc\r\n\n", &[text("a"), text("bc"), text("")]);
        case(16, b"tail", &[text("tail")]);
    }

    #[test]
    fn bad_utf8_is_reported_and_skipped() {
        case(16, b"\xff\xfe\nok\n", &[Line::NotUtf8, text("ok")]);
    }

    #[test]
    fn long_lines_are_discarded_once() {
        case(4, b"abcd\nabcde\nok\n", &[text("abcd"), Line::TooLong, text("ok")]);
        case(4, b"abcdefghijklmnop\nok\n", &[Line::TooLong, text("ok")]);
        case(4, b"abcdefgh", &[]);
    }

    #[test]
    fn partial_frames_wait_for_more() {
        let mut codec = MinerCodec::new(16);
        let mut buf = BytesMut::from(&b"abc"[..]);

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"def\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(text("abcdef")));
    }
}
