//! Background writer thread for diagnostics output, keeping file I/O off the
//! simulation's hot path behind a bounded `mpsc` channel and a single
//! writer thread.

use crate::errors::*;
use crate::output::path::OutputPath;
use pic3d::output::{DensityRow, OutputEntry, CONSERVED_QUANTITIES_HEADER, DENSITY_CSV_HEADER};
use pic3d::Snapshot;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::mpsc::{sync_channel, SyncSender};
use std::thread::{self, JoinHandle};

enum Message {
    Metadata(String),
    Entry(Box<OutputEntry>),
    Snapshot(Box<Snapshot>),
    DensityFrame(Vec<DensityRow>),
}

/// Owns the background thread that serializes diagnostics to disk so the
/// step loop never blocks on file I/O.
pub struct Worker {
    sender: Option<SyncSender<Message>>,
    handle: Option<JoinHandle<Result<()>>>,
    output_filepath: PathBuf,
}

impl Worker {
    pub fn new(queue_size: usize, path: &OutputPath) -> Result<Worker> {
        let conserved_path = path.with_extension("tsv");
        let density_path = path.with_extension("csv");
        let output_filepath = conserved_path.clone();
        let dir = path.dir().to_path_buf();
        let (sender, receiver) = sync_channel(queue_size.max(1));

        let handle = thread::Builder::new()
            .name("pic3d-output".into())
            .spawn(move || -> Result<()> {
                let mut conserved = BufWriter::new(
                    File::create(&conserved_path)
                        .chain_err(|| format!("unable to create '{}'", conserved_path.display()))?,
                );
                conserved
                    .write_all(CONSERVED_QUANTITIES_HEADER.as_bytes())
                    .chain_err(|| "unable to write conserved-quantities header")?;

                // The density CSV is only opened once the first frame
                // arrives, so runs that never configure a density cadence
                // never create an empty `.csv` file.
                let mut density: Option<BufWriter<File>> = None;

                for message in receiver {
                    match message {
                        Message::Metadata(json) => {
                            fs::write(dir.join("metadata.json"), json)
                                .chain_err(|| "unable to write metadata.json")?;
                        }
                        Message::Entry(entry) => {
                            if let Some(c) = &entry.conserved {
                                conserved
                                    .write_all(c.to_row().as_bytes())
                                    .chain_err(|| "unable to append conserved-quantities row")?;
                                conserved.flush().chain_err(|| "unable to flush conserved-quantities log")?;
                            }
                            if let Some(particles) = &entry.particles {
                                let json = serde_json::to_string(particles)
                                    .chain_err(|| "unable to serialize particles")?;
                                let name = format!("particles-{:08}.json", entry.timestep);
                                fs::write(dir.join(name), json).chain_err(|| "unable to write particles snapshot")?;
                            }
                        }
                        Message::Snapshot(snapshot) => {
                            let json = serde_json::to_string(&*snapshot).chain_err(|| "unable to serialize snapshot")?;
                            let name = format!("snapshot-{:08}.json", snapshot.cycle);
                            fs::write(dir.join(name), json).chain_err(|| "unable to write snapshot")?;
                        }
                        Message::DensityFrame(rows) => {
                            let writer = match density.as_mut() {
                                Some(w) => w,
                                None => {
                                    let mut w = BufWriter::new(File::create(&density_path).chain_err(|| {
                                        format!("unable to create '{}'", density_path.display())
                                    })?);
                                    w.write_all(DENSITY_CSV_HEADER.as_bytes())
                                        .chain_err(|| "unable to write density csv header")?;
                                    density = Some(w);
                                    density.as_mut().unwrap()
                                }
                            };
                            for row in &rows {
                                writer
                                    .write_all(row.to_row().as_bytes())
                                    .chain_err(|| "unable to append density csv row")?;
                            }
                            writer.flush().chain_err(|| "unable to flush density csv")?;
                        }
                    }
                }
                Ok(())
            })
            .chain_err(|| "unable to spawn output thread")?;

        Ok(Worker {
            sender: Some(sender),
            handle: Some(handle),
            output_filepath,
        })
    }

    pub fn write_metadata(&self, settings_json: String) -> Result<()> {
        self.send(Message::Metadata(settings_json))
    }

    pub fn append(&self, entry: OutputEntry) -> Result<()> {
        self.send(Message::Entry(Box::new(entry)))
    }

    pub fn write_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.send(Message::Snapshot(Box::new(snapshot)))
    }

    pub fn append_density_frame(&self, rows: Vec<DensityRow>) -> Result<()> {
        self.send(Message::DensityFrame(rows))
    }

    pub fn get_output_filepath(&self) -> &PathBuf {
        &self.output_filepath
    }

    fn send(&self, message: Message) -> Result<()> {
        self.sender
            .as_ref()
            .expect("worker sender dropped before quit()")
            .send(message)
            .chain_err(|| "output thread has gone away")
    }

    /// Stops accepting new messages and joins the writer thread, surfacing
    /// whatever error (if any) it encountered.
    pub fn quit(mut self) -> Result<()> {
        self.sender.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| "output thread panicked")?,
            None => Ok(()),
        }
    }

    /// Like `quit`, but callable from an error path without consuming
    /// ownership issues around an in-flight `&Worker`.
    pub fn emergency_join(self) -> Result<()> {
        self.quit()
    }
}
