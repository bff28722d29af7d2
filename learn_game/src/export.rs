use crate::approximator::Weights;
use crate::error::ExportError;
use crate::stats::TrainingHistory;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Logical name the trained parameters are exported under.
pub const WEIGHTS_NAME: &str = "weights";

/// Destination for the approximator's parameters at the end of training.
pub trait WeightSink {
    fn export_weights(&mut self, name: &str, weights: &Weights) -> Result<(), ExportError>;
}

/// Destination for the win/loss/draw history.
pub trait HistorySink {
    fn export_history(&mut self, history: &TrainingHistory) -> Result<(), ExportError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeightsExport {
    pub name: String,
    pub exported_at: DateTime<Local>,
    pub weights: Weights,
}

/// Writes `<dir>/<name>.json` and `<dir>/<name>.pickle`.
#[derive(Clone, Debug)]
pub struct FileWeightSink {
    dir: PathBuf,
}

/// Writes one CSV row per history interval.
#[derive(Clone, Debug)]
pub struct CsvHistorySink {
    path: PathBuf,
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ExportError + '_ {
    move |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl FileWeightSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileWeightSink { dir: dir.into() }
    }

    pub fn json_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    pub fn pickle_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.pickle"))
    }
}

impl WeightSink for FileWeightSink {
    fn export_weights(&mut self, name: &str, weights: &Weights) -> Result<(), ExportError> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let export = WeightsExport {
            name: name.to_owned(),
            exported_at: Local::now(),
            weights: weights.clone(),
        };

        let json_path = self.json_path(name);
        let file_json = File::create(&json_path).map_err(io_error(&json_path))?;
        let mut writer = BufWriter::new(file_json);
        serde_json::to_writer(&mut writer, &export)?;
        writer.flush().map_err(io_error(&json_path))?;

        let pickle_path = self.pickle_path(name);
        let mut file = File::create(&pickle_path).map_err(io_error(&pickle_path))?;
        serde_pickle::to_writer(&mut file, &export, serde_pickle::SerOptions::new())?;

        debug!(json = %json_path.display(), pickle = %pickle_path.display(), "weights exported");
        Ok(())
    }
}

pub fn load_weights_json(path: &Path) -> Result<WeightsExport, ExportError> {
    let file = File::open(path).map_err(io_error(path))?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

pub fn load_weights_pickle(path: &Path) -> Result<WeightsExport, ExportError> {
    let file = File::open(path).map_err(io_error(path))?;
    Ok(serde_pickle::from_reader(
        BufReader::new(file),
        serde_pickle::DeOptions::new(),
    )?)
}

impl CsvHistorySink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CsvHistorySink { path: path.into() }
    }
}

#[derive(Serialize)]
struct HistoryRow {
    interval: usize,
    episodes: usize,
    wins: u32,
    losses: u32,
    draws: u32,
}

impl HistorySink for CsvHistorySink {
    fn export_history(&mut self, history: &TrainingHistory) -> Result<(), ExportError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let mut writer = csv::Writer::from_path(&self.path)?;
        for (i, stats) in history.rows() {
            writer.serialize(HistoryRow {
                interval: i + 1,
                episodes: (i + 1) * history.interval,
                wins: stats.wins,
                losses: stats.losses,
                draws: stats.draws,
            })?;
        }
        writer.flush().map_err(io_error(&self.path))?;
        debug!(path = %self.path.display(), rows = history.len(), "history exported");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approximator::{ActionValueApproximator, ActionValues};
    use crate::board::Board;
    use crate::encoding::encode;
    use crate::q_table::QTable;
    use crate::stats::TrainingStatistics;

    #[test]
    fn table_weights_survive_json_and_pickle() {
        let dir = tempfile::tempdir().unwrap();
        let mut q = QTable::new(1.0, 0.0);
        let state = encode(&Board::new(), true);
        q.update(&state, &ActionValues::splat(0.0).with_target(4, 3.5));

        let mut sink = FileWeightSink::new(dir.path().join("archive"));
        sink.export_weights(WEIGHTS_NAME, &q.weights()).unwrap();

        for loaded in [
            load_weights_json(&sink.json_path(WEIGHTS_NAME)).unwrap(),
            load_weights_pickle(&sink.pickle_path(WEIGHTS_NAME)).unwrap(),
        ] {
            assert_eq!(loaded.name, WEIGHTS_NAME);
            match loaded.weights {
                Weights::Table(table) => assert_eq!(table.predict(&state)[4], 3.5),
                other => panic!("unexpected weights {other:?}"),
            }
        }
    }

    #[test]
    fn history_csv_has_one_row_per_interval() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.csv");
        let mut history = TrainingHistory::new(50);
        let mut stats = TrainingStatistics {
            wins: 30,
            losses: 5,
            draws: 15,
        };
        history.snapshot(&mut stats);
        stats.wins = 40;
        stats.draws = 10;
        history.snapshot(&mut stats);

        CsvHistorySink::new(&path).export_history(&history).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "interval,episodes,wins,losses,draws");
        assert_eq!(lines[1], "1,50,30,5,15");
        assert_eq!(lines[2], "2,100,40,0,10");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_weights_json(Path::new("/nonexistent/weights.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/weights.json"));
    }
}
