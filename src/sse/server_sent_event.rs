use serde::de::DeserializeOwned;

#[derive(Debug, PartialEq)]
pub struct ServerSentEvent<T> {
    pub id: Option<String>,
    pub event: Option<String>,
    pub retry: Option<usize>,
    pub comment: Option<String>,
    pub data: Option<T>,
}

impl<T> ServerSentEvent<T>
where
    T: DeserializeOwned,
{
    /// Parses a single event block. Multiple `data:` lines are joined with a newline before decoding.
    pub fn from_str(s: &str) -> Result<ServerSentEvent<T>, serde_json::Error> {
        let mut id = None;
        let mut event = None;
        let mut retry = None;
        let mut comment = None;
        let mut data_lines = Vec::new();

        for line in s.lines() {
            if let Some(value) = line.strip_prefix("id:") {
                id = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("event:") {
                event = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("retry:") {
                retry = value.trim().parse::<usize>().ok();
            } else if let Some(value) = line.strip_prefix(':') {
                comment = Some(value.trim().to_string());
            } else if let Some(value) = line.strip_prefix("data:") {
                data_lines.push(value.trim());
            }
        }

        let data = if data_lines.is_empty() {
            None
        } else {
            Some(serde_json::from_str(&data_lines.join("\n"))?)
        };

        Ok(ServerSentEvent {
            id,
            event,
            retry,
            comment,
            data,
        })
    }
}

/// Bytes of the stream that have not formed a complete event block yet.
///
/// Blocks are only decoded once complete, so a character split across chunks stays intact.
#[derive(Debug, Default)]
pub struct EventBuffer {
    bytes: Vec<u8>,
}

impl EventBuffer {
    pub fn new() -> Self {
        EventBuffer::default()
    }

    /// Carriage returns only ever terminate lines in an event stream, they are dropped here.
    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend(chunk.iter().filter(|byte| **byte != b'\r'));
    }

    /// Removes and returns every complete, non-empty event block.
    pub fn drain_blocks(&mut self) -> Vec<String> {
        let mut blocks = Vec::new();
        while let Some(end) = self.bytes.windows(2).position(|window| window == b"\n\n") {
            let block = self.bytes.drain(..end + 2).collect::<Vec<u8>>();
            let text = String::from_utf8_lossy(&block[..end]).into_owned();
            if !text.trim().is_empty() {
                blocks.push(text);
            }
        }
        blocks
    }

    pub fn pending(&self) -> &[u8] {
        &self.bytes
    }
}
