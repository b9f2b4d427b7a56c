/*
 *  The gossip mesh: a flood-broadcast TCP protocol distributing puzzle
 *  instances and best-so-far solutions between worker processes. One accept
 *  thread plus one reader thread per connected peer; solving happens on a
 *  dedicated solver thread dispatched per puzzle.
 */

mod globalbest;
mod options;
mod peer;
pub mod protocol;

pub use globalbest::{GlobalBest, GlobalBestEntry};
pub use options::ClusterConfig;

use std::io::BufReader;
use std::net::{SocketAddr, TcpListener, TcpStream};

use socket2::{SockRef, TcpKeepalive};

use crate::cluster::peer::PeerSet;
use crate::packing::prelude::*;
use crate::solver::SolverParams;
use crate::utils::prelude::*;
use protocol::{accept_handshake, send_secret, BestMessage, Message, PuzzleAnnounce};

/// Ties together the peer set, the global-best register, and (for workers)
/// the solver dispatch. Shared across threads behind an `Arc`.
pub struct Cluster {
    peers: Arc<PeerSet>,
    global_best: Arc<GlobalBest>,
    config: ClusterConfig,
    solver_params: Option<SolverParams>,
    upstream: Mutex<Option<SocketAddr>>,
}

impl Cluster {
    /// Binds the listener, dials `config.link` if present, and returns the
    /// running cluster. `solver_params` being `None` makes this process a
    /// coordinator: it relays messages but never starts a solve.
    pub fn start(config: ClusterConfig, solver_params: Option<SolverParams>) -> Result<Arc<Cluster>> {
        let listener = TcpListener::bind(("0.0.0.0", config.port)).with_context(|| format!("binding gossip listener on port {}", config.port))?;

        let cluster = Arc::new(Cluster {
            peers: Arc::new(PeerSet::new()),
            global_best: Arc::new(GlobalBest::new()),
            config: config.clone(),
            solver_params,
            upstream: Mutex::new(None),
        });

        {
            let cluster = Arc::clone(&cluster);
            std::thread::spawn(move || cluster.accept_loop(listener));
        }

        if let Some(link) = config.link.clone() {
            let cluster = Arc::clone(&cluster);
            std::thread::spawn(move || cluster.dial_loop(link));
        }

        Ok(cluster)
    }

    pub fn global_best(&self) -> &GlobalBest {
        &self.global_best
    }

    fn accept_loop(self: Arc<Self>, listener: TcpListener) {
        for incoming in listener.incoming() {
            let stream = match incoming {
                Ok(stream) => stream,
                Err(err) => {
                    log::warn!("accept failed: {err}");
                    continue;
                }
            };
            let cluster = Arc::clone(&self);
            std::thread::spawn(move || cluster.handle_accepted(stream));
        }
    }

    fn handle_accepted(self: Arc<Self>, stream: TcpStream) {
        let addr = match stream.peer_addr() {
            Ok(addr) => addr,
            Err(err) => {
                log::warn!("accepted connection with no peer address: {err}");
                return;
            }
        };
        if let Err(err) = tune_socket(&stream) {
            log::warn!("could not tune accepted socket from {addr}: {err}");
        }
        let write_half = match stream.try_clone() {
            Ok(s) => s,
            Err(err) => {
                log::warn!("could not clone accepted stream from {addr}: {err}");
                return;
            }
        };
        let mut reader = BufReader::new(stream);
        match accept_handshake(&mut reader, &self.config.secret) {
            Ok(true) => {}
            Ok(false) => {
                log::warn!("peer {addr} failed the handshake, closing");
                return;
            }
            Err(err) => {
                log::warn!("handshake read from {addr} failed: {err}");
                return;
            }
        }

        self.peers.add(addr, write_half);
        log::debug!("peer {addr} joined the mesh ({} peers now)", self.peers.len());
        self.read_messages(reader, addr, false);
    }

    /// Dials `link`, reconnecting with exponential backoff until it
    /// succeeds, since this address is this process's designated upstream:
    /// losing it later is fatal (see `read_messages`), but failing to
    /// *establish* it initially is just transient network noise.
    fn dial_loop(self: Arc<Self>, link: String) {
        let mut backoff = Duration::from_millis(250);
        const MAX_BACKOFF: Duration = Duration::from_secs(30);

        loop {
            match self.dial_once(&link) {
                Ok(()) => return,
                Err(err) => {
                    log::warn!("dial to {link} failed: {err}, retrying in {backoff:?}");
                    std::thread::sleep(backoff);
                    backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
                }
            }
        }
    }

    fn dial_once(self: &Arc<Self>, link: &str) -> Result<()> {
        let mut stream = TcpStream::connect(link).with_context(|| format!("connecting to {link}"))?;
        tune_socket(&stream)?;
        send_secret(&mut stream, &self.config.secret)?;

        let addr = stream.peer_addr()?;
        let write_half = stream.try_clone()?;
        self.peers.add(addr, write_half);
        *self.upstream.lock().unwrap() = Some(addr);
        log::info!("connected to upstream {link}");

        let reader = BufReader::new(stream);
        // Runs on this thread directly: the dial loop has nothing left to
        // do once connected, so it becomes this peer's reader thread.
        self.read_messages(reader, addr, true);
        Ok(())
    }

    fn read_messages(self: &Arc<Self>, mut reader: BufReader<TcpStream>, addr: SocketAddr, is_upstream: bool) {
        use std::io::BufRead;
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line) {
                Ok(0) => break,
                Ok(_) => match Message::from_line(&line) {
                    Ok(msg) => self.handle_message(msg, addr),
                    Err(err) => log::warn!("dropping malformed line from {addr}: {err}"),
                },
                Err(err) => {
                    log::warn!("read from {addr} failed: {err}");
                    break;
                }
            }
        }

        self.peers.remove(addr);
        log::debug!("peer {addr} left the mesh ({} peers remain)", self.peers.len());

        if is_upstream && *self.upstream.lock().unwrap() == Some(addr) {
            log::error!("lost upstream link {addr}, shutting down");
            std::process::exit(1);
        }
    }

    fn handle_message(self: &Arc<Self>, msg: Message, from: SocketAddr) {
        match msg {
            Message::PuzzleAnnounce(announce) => {
                self.global_best.reset(announce.id.clone());
                if let Some(params) = self.solver_params {
                    match Puzzle::new(&announce.puzzle) {
                        Ok(puzzle) => self.dispatch_puzzle(announce.id.clone(), puzzle, params),
                        Err(err) => log::warn!("received malformed puzzle {}: {err}", announce.id),
                    }
                }
                self.broadcast(&Message::PuzzleAnnounce(announce), Some(from));
            }
            Message::Best(best) => {
                if self.global_best.update(&best.puzzle_id, best.score, &best.solution) {
                    self.broadcast(&Message::Best(best), Some(from));
                }
            }
        }
    }

    fn dispatch_puzzle(self: &Arc<Self>, puzzle_id: String, puzzle: Puzzle, params: SolverParams) {
        let cluster = Arc::clone(self);
        std::thread::spawn(move || {
            let mut prng = Prng::seeded();
            crate::solver::solve_and_publish(&puzzle_id, &puzzle, &params, &mut prng, &cluster.global_best, |id, score, solution| {
                cluster.broadcast(&Message::Best(BestMessage { puzzle_id: id.to_owned(), score, solution: solution.to_vec() }), None);
            });
        });
    }

    /// Announces a puzzle to every connected peer and, if this process has a
    /// solver, starts working it locally too. Used by the submit binary's
    /// local-mode path and by the coordinator when fanning a puzzle out.
    pub fn announce_puzzle(self: &Arc<Self>, id: String, puzzle: Puzzle) {
        self.global_best.reset(id.clone());
        let announce = PuzzleAnnounce { id: id.clone(), puzzle: rows_of(&puzzle) };
        if let Some(params) = self.solver_params {
            self.dispatch_puzzle(id, puzzle, params);
        }
        self.broadcast(&Message::PuzzleAnnounce(announce), None);
    }

    fn broadcast(&self, msg: &Message, except: Option<SocketAddr>) {
        match msg.to_line() {
            Ok(line) => self.peers.broadcast_except(&line, except),
            Err(err) => log::warn!("failed to encode outgoing message: {err}"),
        }
    }
}

/// Disables Nagle and enables TCP keepalive on a freshly accepted or dialed
/// stream, the same way on both sides of the connection.
fn tune_socket(stream: &TcpStream) -> Result<()> {
    let sock = SockRef::from(stream);
    sock.set_nodelay(true).context("setting TCP_NODELAY")?;
    sock.set_tcp_keepalive(&TcpKeepalive::new().with_time(Duration::from_secs(60))).context("setting SO_KEEPALIVE")?;
    Ok(())
}

fn rows_of(puzzle: &Puzzle) -> Vec<Vec<u8>> {
    (0..puzzle.height).map(|row| (0..puzzle.width).map(|col| puzzle.cell(row, col).unwrap()).collect()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unbound_cluster() -> Arc<Cluster> {
        Arc::new(Cluster {
            peers: Arc::new(PeerSet::new()),
            global_best: Arc::new(GlobalBest::new()),
            config: ClusterConfig::default(),
            solver_params: None,
            upstream: Mutex::new(None),
        })
    }

    fn loopback_addr(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    #[test]
    fn s6_equal_score_best_is_absorbed_without_improving() {
        let cluster = unbound_cluster();
        cluster.global_best.reset("x");
        let from = loopback_addr(40000);

        cluster.handle_message(Message::Best(BestMessage { puzzle_id: "x".into(), score: 100, solution: vec![1, 2] }), from);
        assert_eq!(cluster.global_best.snapshot().unwrap().score, 100);

        // A's own score echoed back (or B rebroadcasting the same value)
        // must not be treated as an improvement.
        cluster.handle_message(Message::Best(BestMessage { puzzle_id: "x".into(), score: 100, solution: vec![3, 4] }), from);
        let snapshot = cluster.global_best.snapshot().unwrap();
        assert_eq!(snapshot.score, 100);
        assert_eq!(snapshot.solution, vec![1, 2], "equal-score update must not replace the stored solution");
    }

    #[test]
    fn puzzle_announce_resets_global_best_for_the_new_id() {
        let cluster = unbound_cluster();
        cluster.global_best.reset("old");
        cluster.global_best.update("old", 5, &[]);

        cluster.handle_message(
            Message::PuzzleAnnounce(PuzzleAnnounce { id: "new".into(), puzzle: vec![vec![1, 1], vec![1, 1]] }),
            loopback_addr(40001),
        );
        let snapshot = cluster.global_best.snapshot().unwrap();
        assert_eq!(snapshot.puzzle_id, "new");
        assert_eq!(snapshot.score, u32::MAX);
        assert!(snapshot.solution.is_empty());
    }
}
