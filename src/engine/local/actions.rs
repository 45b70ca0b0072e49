use super::files::{move_file, FileMove, Trash};
use super::mistakes::MistakeKey;
use super::results::{move_path, remove_path};
use crate::core::{HintType, LocalActionType, ResultRecord};
use crate::error::{EngineError, EngineResult};
use std::io;
use std::path::Path;

/// Result of a local action: the new record list plus what it did on disk.
/// `failure` holds the first error when only some targets were applied.
#[derive(Debug)]
pub struct Outcome {
    pub records: Vec<ResultRecord>,
    pub moves: Vec<FileMove>,
    pub mistakes: Vec<MistakeKey>,
    pub failure: Option<EngineError>,
}

fn io_error(e: io::Error) -> EngineError {
    match e.kind() {
        io::ErrorKind::NotFound => EngineError::FileIsNotExists,
        io::ErrorKind::AlreadyExists => EngineError::CantCreateFile,
        _ => EngineError::CantWriteFile,
    }
}

/// Hints map onto the concrete action they suggest.
fn hinted(record: &ResultRecord) -> Option<LocalActionType> {
    match (record, record.hint()) {
        (_, HintType::None) => None,
        (ResultRecord::Defect(_), _) => Some(LocalActionType::DeleteDefect),
        (_, HintType::DeleteFirst) => Some(LocalActionType::DeleteFirst),
        (_, HintType::DeleteSecond) => Some(LocalActionType::DeleteSecond),
        (_, HintType::RenameFirstToSecond) => Some(LocalActionType::RenameFirstToSecond),
        (_, HintType::RenameSecondToFirst) => Some(LocalActionType::RenameSecondToFirst),
    }
}

/// Applies one local action to a batch of target records, editing a working
/// copy of the result list as files move.
pub struct ActionBatch<'a> {
    trash: &'a Trash,
    records: Vec<ResultRecord>,
    moves: Vec<FileMove>,
    mistakes: Vec<MistakeKey>,
    failure: Option<EngineError>,
}

impl<'a> ActionBatch<'a> {
    pub fn new(trash: &'a Trash, records: Vec<ResultRecord>) -> Self {
        Self {
            trash,
            records,
            moves: Vec::new(),
            mistakes: Vec::new(),
            failure: None,
        }
    }

    /// Run `action` on each target still present in the working list.
    /// Targets the action does not apply to are skipped; file errors are
    /// logged and the batch carries on.
    pub fn run(&mut self, action: LocalActionType, targets: &[ResultRecord]) {
        for target in targets {
            // an earlier target may already have removed or rewritten this one
            if !self.records.contains(target) {
                continue;
            }
            if let Err(e) = self.apply(action, target) {
                log::warn!("{:?} failed on {}: {}", action, target.first().path.display(), e);
                self.failure.get_or_insert(e);
            }
        }
    }

    fn apply(&mut self, action: LocalActionType, target: &ResultRecord) -> EngineResult<()> {
        let action = match action {
            LocalActionType::PerformHint => match hinted(target) {
                Some(action) => action,
                None => return Ok(()),
            },
            other => other,
        };

        match (action, target) {
            (LocalActionType::Mistake, record) => {
                self.mistakes.push(MistakeKey::of(record));
                self.records.retain(|r| r != record);
                Ok(())
            }
            (LocalActionType::DeleteDefect, ResultRecord::Defect(defect)) => {
                self.delete(&defect.image.path)
            }
            (LocalActionType::DeleteFirst, ResultRecord::DuplPair(pair)) => {
                self.delete(&pair.first.path)
            }
            (LocalActionType::DeleteSecond, ResultRecord::DuplPair(pair)) => {
                self.delete(&pair.second.path)
            }
            (LocalActionType::DeleteBoth, ResultRecord::DuplPair(pair)) => {
                self.delete(&pair.first.path)?;
                self.delete(&pair.second.path)
            }
            (LocalActionType::RenameFirstToSecond, ResultRecord::DuplPair(pair)) => {
                self.rename_onto(&pair.first.path, &pair.second.path)
            }
            (LocalActionType::RenameSecondToFirst, ResultRecord::DuplPair(pair)) => {
                self.rename_onto(&pair.second.path, &pair.first.path)
            }
            _ => Ok(()),
        }
    }

    fn delete(&mut self, path: &Path) -> EngineResult<()> {
        let moved = self.trash.discard(path).map_err(io_error)?;
        log::info!("Deleted {}", path.display());
        self.moves.push(moved);
        remove_path(&mut self.records, path);
        Ok(())
    }

    /// Replace `to` with `from`: the old `to` goes to the trash first.
    fn rename_onto(&mut self, from: &Path, to: &Path) -> EngineResult<()> {
        if !from.exists() {
            return Err(EngineError::FileIsNotExists);
        }
        self.delete(to)?;
        move_file(from, to).map_err(io_error)?;
        log::info!("Renamed {} -> {}", from.display(), to.display());
        self.moves.push(FileMove {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
        });
        move_path(&mut self.records, from, to);
        Ok(())
    }

    /// Fails with the first file error, or `ZeroTarget`, when nothing happened.
    /// A partial run keeps its work and carries the error in the outcome.
    pub fn finish(self) -> EngineResult<Outcome> {
        if self.moves.is_empty() && self.mistakes.is_empty() {
            return Err(self.failure.unwrap_or(EngineError::ZeroTarget));
        }
        Ok(Outcome {
            records: self.records,
            moves: self.moves,
            mistakes: self.mistakes,
            failure: self.failure,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DefectRecord, DefectType, DuplPair, GroupId, ImageInfo, ImageType, TransformType};
    use chrono::{DateTime, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn image(path: &Path) -> ImageInfo {
        ImageInfo {
            id: 0,
            path: path.to_path_buf(),
            size: 1,
            time: DateTime::<Utc>::from_timestamp(0, 0).unwrap(),
            image_type: ImageType::Png,
            width: 1,
            height: 1,
            blockiness: 0.0,
            blurring: 0.0,
            exif: None,
        }
    }

    fn pair(a: &Path, b: &Path, hint: HintType) -> ResultRecord {
        ResultRecord::DuplPair(DuplPair {
            first: image(a),
            second: image(b),
            difference: 0.0,
            transform: TransformType::Turn0,
            group: GroupId(1),
            hint,
        })
    }

    struct Fixture {
        _dir: TempDir,
        trash: Trash,
        a: std::path::PathBuf,
        b: std::path::PathBuf,
        c: std::path::PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let trash = Trash::new(dir.path().join("trash")).unwrap();
        let [a, b, c] = ["a.png", "b.png", "c.png"].map(|n| dir.path().join(n));
        for (p, content) in [(&a, "a"), (&b, "b"), (&c, "c")] {
            fs::write(p, content).unwrap();
        }
        Fixture { _dir: dir, trash, a, b, c }
    }

    #[test]
    fn test_delete_second_removes_every_reference() {
        let f = fixture();
        let records = vec![pair(&f.a, &f.b, HintType::None), pair(&f.c, &f.b, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::DeleteSecond, &records);
        let outcome = batch.finish().unwrap();

        assert!(outcome.records.is_empty());
        assert_eq!(outcome.moves.len(), 1);
        assert!(!f.b.exists());
    }

    #[test]
    fn test_rename_first_to_second() {
        let f = fixture();
        let records = vec![pair(&f.a, &f.b, HintType::None), pair(&f.a, &f.c, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::RenameFirstToSecond, &records[..1]);
        let outcome = batch.finish().unwrap();

        assert!(!f.a.exists());
        assert_eq!(fs::read_to_string(&f.b).unwrap(), "a");
        assert_eq!(outcome.moves.len(), 2);
        assert_eq!(outcome.records.len(), 1);
        assert_eq!(outcome.records[0].first().path, f.b);
    }

    #[test]
    fn test_perform_hint_and_skips() {
        let f = fixture();
        let records = vec![
            pair(&f.a, &f.b, HintType::DeleteFirst),
            pair(&f.b, &f.c, HintType::None),
        ];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::PerformHint, &records);
        let outcome = batch.finish().unwrap();
        assert!(!f.a.exists());
        assert!(f.b.exists());
        assert_eq!(outcome.records.len(), 1);
    }

    #[test]
    fn test_mismatched_action_is_zero_target() {
        let f = fixture();
        let records = vec![pair(&f.a, &f.b, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::DeleteDefect, &records);
        assert_eq!(batch.finish().unwrap_err(), EngineError::ZeroTarget);
    }

    #[test]
    fn test_missing_file_reports_error() {
        let f = fixture();
        let defect = ResultRecord::Defect(DefectRecord {
            image: image(&f.a),
            defect: DefectType::Unknown,
            hint: HintType::DeleteFirst,
        });
        fs::remove_file(&f.a).unwrap();
        let mut batch = ActionBatch::new(&f.trash, vec![defect.clone()]);
        batch.run(LocalActionType::DeleteDefect, &[defect]);
        assert_eq!(batch.finish().unwrap_err(), EngineError::FileIsNotExists);
    }

    #[test]
    fn test_partial_failure_keeps_work_and_reports_error() {
        let f = fixture();
        let d = f.c.with_file_name("d.png");
        fs::write(&d, "d").unwrap();
        fs::remove_file(&f.c).unwrap();
        let records = vec![pair(&f.a, &f.b, HintType::None), pair(&f.c, &d, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::DeleteFirst, &records);
        let outcome = batch.finish().unwrap();

        assert_eq!(outcome.failure, Some(EngineError::FileIsNotExists));
        assert_eq!(outcome.moves.len(), 1);
        assert!(!f.a.exists());
        assert_eq!(outcome.records, vec![records[1].clone()]);
    }

    #[test]
    fn test_delete_both_stops_after_first_error() {
        let f = fixture();
        let missing = f.c.with_file_name("gone.png");
        let records = vec![pair(&f.a, &missing, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::DeleteBoth, &records);
        let outcome = batch.finish().unwrap();

        assert_eq!(outcome.failure, Some(EngineError::FileIsNotExists));
        assert_eq!(outcome.moves.len(), 1);
        assert!(!f.a.exists());
    }

    #[test]
    fn test_mistake_touches_no_files() {
        let f = fixture();
        let records = vec![pair(&f.a, &f.b, HintType::None)];
        let mut batch = ActionBatch::new(&f.trash, records.clone());
        batch.run(LocalActionType::Mistake, &records);
        let outcome = batch.finish().unwrap();
        assert!(outcome.records.is_empty());
        assert!(outcome.moves.is_empty());
        assert_eq!(outcome.mistakes.len(), 1);
        assert!(f.a.exists() && f.b.exists());
    }
}
