//! Headless Demo: run a program without a terminal and inspect its frames.
//!
//! A producer thread feeds log lines into a scrolling view. Each presented
//! frame is summarized with the regions the diff engine reported dirty.

use std::thread;
use std::time::Duration;

use bubblegum::{Cmd, HeadlessBackend, Model, ModelError, Msg, Program, ProgramConfig};

const LINES: [&str; 6] = [
    "\x1b[32mok\x1b[0m   resolved 14 packages",
    "\x1b[32mok\x1b[0m   downloaded crossterm",
    "\x1b[33mwarn\x1b[0m slow mirror, retrying",
    "\x1b[32mok\x1b[0m   downloaded tracing",
    "\x1b[31merr\x1b[0m  checksum mismatch",
    "\x1b[1mdone\x1b[0m",
];

struct Log {
    lines: Vec<String>,
    visible: usize,
}

impl Model for Log {
    type Custom = String;

    fn update(&mut self, msg: Msg<String>) -> Result<Option<Cmd<String>>, ModelError> {
        if let Msg::User(line) = msg {
            let done = line.contains("done");
            self.lines.push(line);
            if done {
                return Ok(Some(Cmd::tick(Duration::from_millis(50), |_| Msg::Quit)));
            }
        }
        Ok(None)
    }

    fn view(&self) -> Result<String, ModelError> {
        let start = self.lines.len().saturating_sub(self.visible);
        let mut out = format!("\x1b[1mbuild log\x1b[0m ({} lines)\n", self.lines.len());
        out.push_str(&self.lines[start..].join("\n"));
        Ok(out)
    }
}

fn main() -> Result<(), bubblegum::ProgramError> {
    let backend = HeadlessBackend::new();
    let frames = backend.log();
    let config = ProgramConfig::default().with_size(320, 80);
    let program = Program::with_config(
        Log {
            lines: Vec::new(),
            visible: 3,
        },
        backend,
        config,
    );

    let handle = program.handle();
    let producer = thread::spawn(move || {
        for line in LINES {
            thread::sleep(Duration::from_millis(30));
            if !handle.send(Msg::User(line.to_string())) {
                break;
            }
        }
    });

    let model = program.run()?;
    let _ = producer.join();

    for (n, frame) in frames.frames().iter().enumerate() {
        println!("frame {n}: {} dirty region(s) {:?}", frame.regions.len(), frame.regions);
        for y in 0..frame.grid.height() {
            if let Some(text) = frame.grid.line_text(y) {
                println!("  |{}|", text.trim_end());
            }
        }
    }
    println!("{} lines received", model.lines.len());
    Ok(())
}
