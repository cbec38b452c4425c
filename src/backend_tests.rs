//! Backend tests against a scripted local server

use crossbeam_channel::{unbounded, Receiver, Sender};
use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::protocol::{BackendAction, UiEvent};

const WAIT: Duration = Duration::from_secs(5);

/// One accepted client connection, seen from the server side.
struct FakeServer {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl FakeServer {
    fn accept(listener: TcpListener) -> Self {
        let (stream, _) = listener.accept().unwrap();
        stream.set_read_timeout(Some(WAIT)).unwrap();
        let writer = stream.try_clone().unwrap();
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    fn read_line(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).unwrap();
        self.writer.write_all(b"\r\n").unwrap();
        self.writer.flush().unwrap();
    }
}

fn start_backend(debug: bool) -> (Sender<BackendAction>, Receiver<UiEvent>) {
    let (action_tx, action_rx) = unbounded::<BackendAction>();
    let (event_tx, event_rx) = unbounded::<UiEvent>();
    thread::spawn(move || crate::backend::run_backend(action_rx, event_tx, debug));
    (action_tx, event_rx)
}

fn connect(action_tx: &Sender<BackendAction>, port: u16, nickname: &str) {
    action_tx
        .send(BackendAction::Connect {
            server: "127.0.0.1".into(),
            port,
            nickname: nickname.into(),
            use_tls: false,
            tls_verify: false,
        })
        .unwrap();
}

/// Next event that is not a raw debug line.
fn next_event(event_rx: &Receiver<UiEvent>) -> UiEvent {
    loop {
        match event_rx.recv_timeout(WAIT).unwrap() {
            UiEvent::Raw(_) => continue,
            event => return event,
        }
    }
}

#[test]
fn test_backend_stops_when_front_end_goes_away() {
    let (action_tx, action_rx) = unbounded::<BackendAction>();
    let (event_tx, _event_rx) = unbounded::<UiEvent>();

    let handle = thread::spawn(move || crate::backend::run_backend(action_rx, event_tx, false));
    drop(action_tx);

    handle.join().unwrap();
}

#[test]
fn test_actions_without_connection_report_error() {
    let (action_tx, event_rx) = start_backend(false);
    action_tx.send(BackendAction::Join("#test".into())).unwrap();
    assert_eq!(next_event(&event_rx), UiEvent::Error("Not connected".into()));
}

#[test]
fn test_connection_refused_reports_error() {
    // Grab a free port, then close it again
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let (action_tx, event_rx) = start_backend(false);
    connect(&action_tx, port, "alice");
    assert!(matches!(next_event(&event_rx), UiEvent::Error(_)));
}

#[test]
fn test_registration_join_and_chat() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (action_tx, event_rx) = start_backend(false);
    connect(&action_tx, port, "alice");

    let mut server = FakeServer::accept(listener);
    assert_eq!(server.read_line(), "NICK alice");
    assert!(server.read_line().starts_with("USER alice 0 *"));

    server.send(":irc.test 001 alice :Welcome to the test network");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Welcome {
            nick: "alice".into()
        }
    );

    action_tx.send(BackendAction::Join("#test".into())).unwrap();
    assert_eq!(server.read_line(), "JOIN #test");
    assert_eq!(server.read_line(), "NAMES #test");

    server.send(":alice!a@host JOIN #test");
    server.send(":irc.test 353 alice = #test :@alice +bob carol");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Joined {
            channel: "#test".into(),
            nick: "alice".into()
        }
    );
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Names {
            channel: "#test".into(),
            names: vec!["alice".into(), "bob".into(), "carol".into()],
        }
    );

    // PING is answered by the backend and never reaches the front end
    server.send("PING :irc.test");
    assert_eq!(server.read_line(), "PONG irc.test");

    server.send(":bob!b@host PRIVMSG #test :hi alice");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Message {
            target: "#test".into(),
            sender: "bob".into(),
            text: "hi alice".into(),
        }
    );

    action_tx
        .send(BackendAction::SendMessage {
            target: "#test".into(),
            text: "hello bob".into(),
        })
        .unwrap();
    assert_eq!(server.read_line(), "PRIVMSG #test :hello bob");

    action_tx
        .send(BackendAction::Identify {
            account: "alice".into(),
            password: "secret".into(),
        })
        .unwrap();
    assert_eq!(server.read_line(), "PRIVMSG NickServ :IDENTIFY alice secret");

    action_tx.send(BackendAction::Quit("bye now".into())).unwrap();
    assert_eq!(server.read_line(), "QUIT :bye now");
    assert_eq!(next_event(&event_rx), UiEvent::Disconnected("User quit".into()));
}

#[test]
fn test_nick_collision_and_own_rename() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (action_tx, event_rx) = start_backend(true);
    connect(&action_tx, port, "alice");

    let mut server = FakeServer::accept(listener);
    server.read_line();
    server.read_line();

    server.send(":irc.test 433 * alice :Nickname is already in use");
    assert_eq!(next_event(&event_rx), UiEvent::NicknameInUse("alice".into()));

    action_tx.send(BackendAction::Nick("alice_1f".into())).unwrap();
    assert_eq!(server.read_line(), "NICK alice_1f");

    server.send(":irc.test 001 alice_1f :Welcome");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Welcome {
            nick: "alice_1f".into()
        }
    );

    server.send(":alice_1f!a@host NICK alicia");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::NickChanged {
            old: "alice_1f".into(),
            new: "alicia".into()
        }
    );

    // Our own JOIN is now recognised under the new nick
    server.send(":alicia!a@host JOIN #test");
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Joined {
            channel: "#test".into(),
            nick: "alicia".into()
        }
    );
}

#[test]
fn test_debug_mode_forwards_raw_lines() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (action_tx, event_rx) = start_backend(true);
    connect(&action_tx, port, "alice");

    let mut server = FakeServer::accept(listener);
    server.read_line();
    server.read_line();
    server.send(":irc.test NOTICE * :*** Looking up your hostname");

    assert_eq!(
        event_rx.recv_timeout(WAIT).unwrap(),
        UiEvent::Raw(":irc.test NOTICE * :*** Looking up your hostname".into())
    );
    assert_eq!(
        event_rx.recv_timeout(WAIT).unwrap(),
        UiEvent::Notice {
            sender: "irc.test".into(),
            text: "*** Looking up your hostname".into(),
        }
    );
}

#[test]
fn test_server_closing_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (action_tx, event_rx) = start_backend(false);
    connect(&action_tx, port, "alice");

    let mut server = FakeServer::accept(listener);
    server.read_line();
    server.read_line();
    server.send("ERROR :Closing Link: alice (Quit)");
    drop(server);

    assert_eq!(
        next_event(&event_rx),
        UiEvent::ServerError("Closing Link: alice (Quit)".into())
    );
    assert_eq!(
        next_event(&event_rx),
        UiEvent::Disconnected("Connection closed by server".into())
    );
}
