use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

use crate::utils::prelude::*;

/// Fixed shared secret sent by the dialing side of every connection before
/// any JSON framing. The accepting side checks it; the dialer never gets one
/// back. This is an integrity marker, not authentication.
pub const DEFAULT_SECRET: &str = "sqpack-gossip-v1";

/// One line of the gossip wire format. Distinguished structurally: a
/// `PuzzleAnnounce` carries a `puzzle` field, a `Best` does not.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Message {
    PuzzleAnnounce(PuzzleAnnounce),
    Best(BestMessage),
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct PuzzleAnnounce {
    pub id: String,
    pub puzzle: Vec<Vec<u8>>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct BestMessage {
    pub puzzle_id: String,
    pub score: u32,
    pub solution: Vec<u32>,
}

impl Message {
    pub fn to_line(&self) -> Result<String> {
        let mut line = serde_json::to_string(self).context("encoding gossip message")?;
        line.push_str("\r\n");
        Ok(line)
    }

    pub fn from_line(line: &str) -> Result<Message> {
        serde_json::from_str(line.trim_end()).context("decoding gossip message")
    }
}

/// Sends the shared secret as the dialing side of a fresh connection, before
/// any JSON framing.
pub fn send_secret(stream: &mut TcpStream, secret: &str) -> Result<()> {
    stream.write_all(format!("{secret}\r\n").as_bytes())?;
    Ok(())
}

/// Reads the first line off an accepted connection and checks it against the
/// shared secret. Returns the reader positioned just after that line so the
/// caller can keep reading message lines from the same buffer.
pub fn accept_handshake(reader: &mut BufReader<TcpStream>, secret: &str) -> Result<bool> {
    let mut line = String::new();
    let n = reader.read_line(&mut line)?;
    if n == 0 {
        return Ok(false);
    }
    Ok(line.trim_end() == secret)
}
