use std::io::Write;
use std::net::{SocketAddr, TcpStream};

use crate::utils::prelude::*;

/// One authenticated connection to another gossip process. `stream` is a
/// clone used only for writes; the reader thread for this peer owns its own
/// clone so a broadcast write never blocks that thread's socket read.
struct Peer {
    addr: SocketAddr,
    stream: TcpStream,
}

/// Process-wide set of active authenticated peers, guarded by a single
/// mutex. Accept/reader threads add and remove entries; broadcasting holds
/// the lock for the whole iteration.
pub struct PeerSet {
    peers: Mutex<Vec<Peer>>,
}

impl PeerSet {
    pub fn new() -> PeerSet {
        PeerSet { peers: Mutex::new(Vec::new()) }
    }

    pub fn add(&self, addr: SocketAddr, stream: TcpStream) {
        self.peers.lock().unwrap().push(Peer { addr, stream });
    }

    pub fn remove(&self, addr: SocketAddr) {
        self.peers.lock().unwrap().retain(|p| p.addr != addr);
    }

    pub fn len(&self) -> usize {
        self.peers.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes `line` to every peer other than `except`. A single peer's
    /// write failing only drops that peer from the set; it does not stop
    /// the broadcast to the rest.
    pub fn broadcast_except(&self, line: &str, except: Option<SocketAddr>) {
        let mut guard = self.peers.lock().unwrap();
        guard.retain_mut(|peer| {
            if Some(peer.addr) == except {
                return true;
            }
            match peer.stream.write_all(line.as_bytes()) {
                Ok(()) => true,
                Err(err) => {
                    log::warn!("dropping peer {} after write failure: {err}", peer.addr);
                    false
                }
            }
        });
    }
}

impl Default for PeerSet {
    fn default() -> Self {
        PeerSet::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{TcpListener, ToSocketAddrs};

    fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr.to_socket_addrs().unwrap().next().unwrap()).unwrap();
        let (server, _) = listener.accept().unwrap();
        (client, server)
    }

    #[test]
    fn broadcast_except_skips_the_sender() {
        let set = PeerSet::new();
        let (a_client, a_server) = connected_pair();
        let (b_client, b_server) = connected_pair();
        set.add(a_client.local_addr().unwrap(), a_server);
        set.add(b_client.local_addr().unwrap(), b_server);
        assert_eq!(set.len(), 2);

        set.broadcast_except("hello\r\n", Some(a_client.local_addr().unwrap()));

        use std::io::{BufRead, BufReader};
        let mut b_reader = BufReader::new(b_client);
        let mut line = String::new();
        b_reader.read_line(&mut line).unwrap();
        assert_eq!(line, "hello\r\n");
    }
}
