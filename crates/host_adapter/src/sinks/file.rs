//! JsonLinesHost - appends outbound events to a JSON-lines file

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, HostRuntime, OutboundEvent};
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

#[derive(Debug, Clone)]
pub struct JsonLinesHostConfig {
    pub path: PathBuf,
    /// Keep existing content instead of truncating
    pub append: bool,
}

impl JsonLinesHostConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            append: false,
        }
    }
}

/// One line of the output file
#[derive(Serialize)]
struct Record<'a> {
    /// Wall-clock time the event was written
    recorded_at: String,
    #[serde(flatten)]
    event: &'a OutboundEvent,
}

/// Host output that records every outbound event for offline inspection
pub struct JsonLinesHost {
    name: String,
    config: JsonLinesHostConfig,
    writer: BufWriter<File>,
    lines: u64,
}

impl JsonLinesHost {
    pub fn new(name: impl Into<String>, config: JsonLinesHostConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(config.append)
            .truncate(!config.append)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            writer: BufWriter::new(file),
            lines: 0,
        })
    }

    /// Lines written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    fn write_record(&mut self, event: &OutboundEvent) -> std::io::Result<()> {
        let record = Record {
            recorded_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            event,
        };
        serde_json::to_writer(&mut self.writer, &record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }
}

impl HostRuntime for JsonLinesHost {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "json_lines_host_emit",
        skip(self, event),
        fields(host = %self.name, time = event.time)
    )]
    async fn emit(&mut self, event: OutboundEvent) -> Result<(), ContractError> {
        self.write_record(&event).map_err(|e| {
            error!(host = %self.name, path = %self.config.path.display(), error = %e, "write failed");
            ContractError::host_emit(&self.name, e.to_string())
        })
    }

    #[instrument(name = "json_lines_host_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.writer
            .flush()
            .map_err(|e| ContractError::host_emit(&self.name, e.to_string()))?;
        debug!(host = %self.name, lines = self.lines, "JsonLinesHost closed");
        Ok(())
    }
}
