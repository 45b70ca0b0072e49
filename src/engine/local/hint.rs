use crate::core::{DefectRecord, DuplPair, HintType, ImageInfo, ResultRecord};
use crate::options::CoreOptions;
use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Valid,
    Delete,
    Plain,
}

fn role(path: &Path, options: &CoreOptions) -> Role {
    if options.valid_paths.iter().any(|e| e.contains(path)) {
        Role::Valid
    } else if options.delete_paths.iter().any(|e| e.contains(path)) {
        Role::Delete
    } else {
        Role::Plain
    }
}

/// `Greater` when `a` is the better image: larger area, then larger file,
/// then fewer artifacts.
pub fn quality(a: &ImageInfo, b: &ImageInfo) -> Ordering {
    a.area()
        .cmp(&b.area())
        .then(a.size.cmp(&b.size))
        .then_with(|| (b.blockiness + b.blurring).total_cmp(&(a.blockiness + a.blurring)))
}

pub fn defect_hint(defect: &DefectRecord, options: &CoreOptions) -> HintType {
    match role(&defect.image.path, options) {
        Role::Valid => HintType::None,
        _ => HintType::DeleteFirst,
    }
}

pub fn pair_hint(pair: &DuplPair, options: &CoreOptions) -> HintType {
    let first = role(&pair.first.path, options);
    let second = role(&pair.second.path, options);
    let order = quality(&pair.first, &pair.second);
    match (first, second) {
        (Role::Valid, Role::Valid) => HintType::None,
        (Role::Valid, _) => HintType::DeleteSecond,
        (_, Role::Valid) => HintType::DeleteFirst,
        (Role::Delete, Role::Plain) if order == Ordering::Greater => {
            HintType::RenameFirstToSecond
        }
        (Role::Delete, Role::Plain) => HintType::DeleteFirst,
        (Role::Plain, Role::Delete) if order == Ordering::Less => HintType::RenameSecondToFirst,
        (Role::Plain, Role::Delete) => HintType::DeleteSecond,
        _ if order == Ordering::Less => HintType::DeleteFirst,
        _ => HintType::DeleteSecond,
    }
}

pub fn apply(records: &mut [ResultRecord], options: &CoreOptions) {
    for record in records {
        let hint = match record {
            ResultRecord::Defect(defect) => defect_hint(defect, options),
            ResultRecord::DuplPair(pair) => pair_hint(pair, options),
        };
        record.set_hint(hint);
    }
}
