//! External annotator process
//!
//! Spawns an annotator command through `sh -c` and talks JSON lines over
//! its stdin/stdout: one `{"text": ...}` request per line, answered by one
//! annotated sentence (or `{"error": ...}`) per line, in request order.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use qasynth_core::{AnnotatedSentence, Annotator, QaError, Result};

/// Requests written ahead of reading responses in a batch
const PIPELINE_DEPTH: usize = 64;

#[derive(Serialize)]
struct Request<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Response {
    Failure { error: String },
    Sentence(AnnotatedSentence),
}

struct Session {
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl Session {
    fn send(&mut self, text: &str) -> Result<()> {
        let line = serde_json::to_string(&Request { text }).map_err(anyhow::Error::from)?;
        writeln!(self.stdin, "{}", line).map_err(unavailable)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.stdin.flush().map_err(unavailable)
    }

    fn receive(&mut self, expected: &str) -> Result<AnnotatedSentence> {
        let mut line = String::new();
        let read = self.stdout.read_line(&mut line).map_err(unavailable)?;
        if read == 0 {
            return Err(QaError::AnnotationUnavailable(
                "annotator process closed its output".to_string(),
            ));
        }

        let response: Response = serde_json::from_str(line.trim_end()).map_err(|e| {
            QaError::AnnotationUnavailable(format!("malformed annotator response: {}", e))
        })?;
        match response {
            Response::Failure { error } => Err(QaError::AnnotationUnavailable(error)),
            Response::Sentence(sentence) if sentence.text() == expected => Ok(sentence),
            Response::Sentence(sentence) => Err(QaError::AnnotationUnavailable(format!(
                "annotator answered {:?} for {:?}",
                sentence.text(),
                expected
            ))),
        }
    }
}

fn unavailable(error: std::io::Error) -> QaError {
    QaError::AnnotationUnavailable(format!("annotator I/O failed: {}", error))
}

/// Annotator backed by a long-running child process
pub struct ProcessAnnotator {
    command: String,
    child: Mutex<Child>,
    session: Mutex<Session>,
}

impl ProcessAnnotator {
    /// Start the annotator command
    pub fn spawn(command: &str) -> Result<Self> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| {
                QaError::AnnotationUnavailable(format!("failed to start {:?}: {}", command, e))
            })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (Some(stdin), Some(stdout)) = (stdin, stdout) else {
            let _ = child.kill();
            return Err(QaError::AnnotationUnavailable(
                "annotator pipes unavailable".to_string(),
            ));
        };

        info!(command, pid = child.id(), "Started annotator process");

        Ok(Self {
            command: command.to_string(),
            child: Mutex::new(child),
            session: Mutex::new(Session {
                stdin,
                stdout: BufReader::new(stdout),
            }),
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn session(&self) -> Result<MutexGuard<'_, Session>> {
        self.session.lock().map_err(|_| {
            QaError::AnnotationUnavailable("annotator session poisoned".to_string())
        })
    }
}

impl Annotator for ProcessAnnotator {
    fn annotate(&self, text: &str) -> Result<AnnotatedSentence> {
        let mut session = self.session()?;
        session.send(text)?;
        session.flush()?;
        session.receive(text)
    }

    fn annotate_many(&self, texts: &[String]) -> Result<Vec<AnnotatedSentence>> {
        let mut session = self.session()?;
        let mut sentences = Vec::with_capacity(texts.len());

        for chunk in texts.chunks(PIPELINE_DEPTH) {
            for text in chunk {
                session.send(text)?;
            }
            session.flush()?;
            for text in chunk {
                sentences.push(session.receive(text)?);
            }
        }

        debug!(count = sentences.len(), "Annotated batch");
        Ok(sentences)
    }
}

impl Drop for ProcessAnnotator {
    fn drop(&mut self) {
        if let Ok(child) = self.child.get_mut() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
