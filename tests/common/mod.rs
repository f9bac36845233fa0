use lander::*;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;

#[allow(dead_code)]
pub const API_URL: &str = "http://127.0.0.1:40004";

#[allow(dead_code)]
pub fn airborne(x: f64, y: f64, xv: f64, yv: f64, theta: f64, omega: f64) -> StateVector {
    StateVector::from_slice(&[x, y, xv, yv, theta, omega, 0., 0.]).unwrap()
}

#[allow(dead_code)]
pub fn landed(x: f64, y: f64, xv: f64, yv: f64, theta: f64, omega: f64) -> StateVector {
    StateVector::from_slice(&[x, y, xv, yv, theta, omega, 1., 1.]).unwrap()
}

#[allow(dead_code)]
pub fn discrete_value(action: &Action) -> DiscreteAction {
    match action {
        Action::Discrete(a) => *a,
        _ => panic!("{action:?} is not Action::Discrete."),
    }
}

#[allow(dead_code)]
pub fn continuous_values(action: &Action) -> (f64, f64) {
    match action {
        Action::Continuous { main, lateral } => (*main, *lateral),
        _ => panic!("{action:?} is not Action::Continuous."),
    }
}

/// Local stand-in for a gymnasium http server. Answers `METHOD path` pairs from a fixed table
/// (404 otherwise) and records every request it receives.
#[allow(dead_code)]
pub struct ScriptedServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedServer {
    pub fn start(routes: Vec<(&'static str, &'static str, Value)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(vec![]));

        let seen = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                answer(stream, &routes, &seen);
            }
        });

        Self { url, requests }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[allow(dead_code)]
fn answer(mut stream: TcpStream, routes: &[(&str, &str, Value)], seen: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    let mut parts = line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).unwrap();
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((k, v)) = header.split_once(':') {
            if k.eq_ignore_ascii_case("content-length") {
                content_length = v.trim().parse().unwrap();
            }
        }
    }
    let mut body = vec![0; content_length];
    reader.read_exact(&mut body).unwrap();

    seen.lock().unwrap().push(format!("{method} {path}"));

    let (status, body) = match routes.iter().find(|(m, p, _)| *m == method && *p == path) {
        Some((_, _, v)) => ("200 OK", v.to_string()),
        None => ("404 Not Found", "{}".to_string()),
    };
    write!(
        stream,
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    )
    .unwrap();
}
