use super::hint;
use super::selection::Selection;
use crate::core::{
    Group, GroupId, ImageInfo, ResultRecord, SelectionType, SortType, TargetType,
};
use crate::error::{EngineError, EngineResult};
use crate::options::CoreOptions;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Connected component of duplicate pairs.
#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub id: GroupId,
    pub images: Vec<ImageInfo>,
}

impl GroupEntry {
    pub fn summary(&self) -> Group {
        Group {
            id: self.id,
            size: self.images.len(),
        }
    }
}

/// The result list together with its groups, selection and cursor.
#[derive(Debug)]
pub struct ResultSet {
    records: Vec<ResultRecord>,
    groups: Vec<GroupEntry>,
    next_group: u64,
    pub selection: Selection,
    current: Option<usize>,
}

impl Default for ResultSet {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            groups: Vec::new(),
            next_group: 1,
            selection: Selection::default(),
            current: None,
        }
    }
}

fn find(parent: &mut [usize], mut node: usize) -> usize {
    while parent[node] != node {
        parent[node] = parent[parent[node]];
        node = parent[node];
    }
    node
}

fn rank(sort: SortType, a: &ResultRecord, b: &ResultRecord) -> Ordering {
    match sort {
        SortType::Type => (a.kind() as u8).cmp(&(b.kind() as u8)),
        SortType::Difference => difference(a).total_cmp(&difference(b)),
        SortType::Hint => (a.hint() as u8).cmp(&(b.hint() as u8)),
        SortType::Group => a.group().cmp(&b.group()),
        SortType::FirstPath => a.first().path.cmp(&b.first().path),
        SortType::SecondPath => a
            .second()
            .map(|i| &i.path)
            .cmp(&b.second().map(|i| &i.path)),
        SortType::FirstSize => a.first().size.cmp(&b.first().size),
        SortType::SecondSize => a.second().map(|i| i.size).cmp(&b.second().map(|i| i.size)),
        SortType::FirstArea => a.first().area().cmp(&b.first().area()),
        SortType::SecondArea => a
            .second()
            .map(ImageInfo::area)
            .cmp(&b.second().map(ImageInfo::area)),
    }
}

fn difference(record: &ResultRecord) -> f64 {
    match record {
        ResultRecord::Defect(_) => 0.0,
        ResultRecord::DuplPair(pair) => pair.difference,
    }
}

fn images_mut(record: &mut ResultRecord) -> Vec<&mut ImageInfo> {
    match record {
        ResultRecord::Defect(defect) => vec![&mut defect.image],
        ResultRecord::DuplPair(pair) => vec![&mut pair.first, &mut pair.second],
    }
}

fn is_degenerate(record: &ResultRecord) -> bool {
    matches!(record, ResultRecord::DuplPair(pair) if pair.first.path == pair.second.path)
}

impl ResultSet {
    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Install a new record list. Groups are rebuilt, both selection domains
    /// are cleared and the cursor is clamped.
    pub fn replace(&mut self, records: Vec<ResultRecord>) {
        self.records = records;
        self.regroup();
        self.selection.clear_results();
        self.current = match self.records.len() {
            0 => None,
            len => Some(self.current.unwrap_or(0).min(len - 1)),
        };
    }

    pub fn clear(&mut self) {
        self.replace(Vec::new());
    }

    /// Rebuild groups from the duplicate pairs. Ids come from a counter that
    /// survives regrouping, so a stale id never resolves to a new group.
    pub fn regroup(&mut self) {
        let mut nodes: HashMap<PathBuf, usize> = HashMap::new();
        let mut images: Vec<ImageInfo> = Vec::new();
        let mut parent: Vec<usize> = Vec::new();
        let mut pair_nodes = Vec::with_capacity(self.records.len());

        let mut node_for = |image: &ImageInfo,
                            nodes: &mut HashMap<PathBuf, usize>,
                            parent: &mut Vec<usize>| {
            *nodes.entry(image.path.clone()).or_insert_with(|| {
                images.push(image.clone());
                parent.push(parent.len());
                parent.len() - 1
            })
        };

        for record in &self.records {
            match record {
                ResultRecord::DuplPair(pair) => {
                    let a = node_for(&pair.first, &mut nodes, &mut parent);
                    let b = node_for(&pair.second, &mut nodes, &mut parent);
                    let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
                    if ra != rb {
                        parent[rb] = ra;
                    }
                    pair_nodes.push(Some(a));
                }
                ResultRecord::Defect(_) => pair_nodes.push(None),
            }
        }

        let mut slots: HashMap<usize, usize> = HashMap::new();
        let mut groups: Vec<GroupEntry> = Vec::new();
        for (node, image) in images.into_iter().enumerate() {
            let root = find(&mut parent, node);
            let slot = match slots.get(&root) {
                Some(&slot) => slot,
                None => {
                    groups.push(GroupEntry {
                        id: GroupId(self.next_group),
                        images: Vec::new(),
                    });
                    self.next_group += 1;
                    slots.insert(root, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[slot].images.push(image);
        }

        for (record, node) in self.records.iter_mut().zip(pair_nodes) {
            if let (ResultRecord::DuplPair(pair), Some(node)) = (record, node) {
                let root = find(&mut parent, node);
                if let Some(&slot) = slots.get(&root) {
                    pair.group = groups[slot].id;
                }
            }
        }

        self.groups = groups;
        self.selection.clear_images();
    }

    pub fn groups(&self) -> &[GroupEntry] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> EngineResult<&GroupEntry> {
        self.groups
            .iter()
            .find(|g| g.id == id)
            .ok_or(EngineError::InvalidGroupId)
    }

    pub fn set_hints(&mut self, options: &CoreOptions) {
        hint::apply(&mut self.records, options);
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn set_current(&mut self, index: usize) -> EngineResult<()> {
        if index >= self.records.len() {
            return Err(EngineError::InvalidIndex);
        }
        self.current = Some(index);
        Ok(())
    }

    pub fn select(&mut self, selection: SelectionType) -> EngineResult<()> {
        let len = self.records.len();
        match selection {
            SelectionType::SelectAll => self.selection.select_all(len),
            SelectionType::UnselectAll => self.selection.clear_results(),
            SelectionType::SelectCurrent | SelectionType::UnselectCurrent => {
                let current = self.current.ok_or(EngineError::ZeroTarget)?;
                let value = selection == SelectionType::SelectCurrent;
                self.selection.set_results(current, 1, len, value);
            }
            SelectionType::SelectAllButThis => {
                self.selection.select_all(len);
                if let Some(current) = self.current {
                    self.selection.set_results(current, 1, len, false);
                }
            }
        }
        Ok(())
    }

    /// Indices an action addresses.
    pub fn targets(&self, target: TargetType) -> Vec<usize> {
        match target {
            TargetType::Current => self.current.into_iter().collect(),
            TargetType::Selected => self.selection.selected().collect(),
        }
    }

    /// What an enabled-check looks at: the selection when there is one,
    /// otherwise the current record.
    pub fn focus(&self) -> Vec<&ResultRecord> {
        let indices = if self.selection.has_selection() {
            self.targets(TargetType::Selected)
        } else {
            self.targets(TargetType::Current)
        };
        indices
            .into_iter()
            .filter_map(|i| self.records.get(i))
            .collect()
    }

    /// Stable sort. Selection and cursor follow their records.
    pub fn sort(&mut self, sort: SortType, increasing: bool) {
        let mut order: Vec<usize> = (0..self.records.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = rank(sort, &self.records[a], &self.records[b]);
            if increasing {
                ord
            } else {
                ord.reverse()
            }
        });
        let mut slots: Vec<Option<ResultRecord>> =
            std::mem::take(&mut self.records).into_iter().map(Some).collect();
        self.records = order.iter().filter_map(|&old| slots[old].take()).collect();
        self.selection.permute(&order);
        self.current = self
            .current
            .and_then(|current| order.iter().position(|&old| old == current));
    }

    /// Drop records whose files are gone and re-stat the rest.
    pub fn refresh(&mut self) -> usize {
        let before = self.records.len();
        let mut records = std::mem::take(&mut self.records);
        records.retain_mut(|record| {
            images_mut(record).into_iter().all(|image| {
                match fs::metadata(&image.path) {
                    Ok(meta) => {
                        image.size = meta.len();
                        if let Ok(modified) = meta.modified() {
                            image.time = DateTime::<Utc>::from(modified);
                        }
                        true
                    }
                    Err(_) => false,
                }
            })
        });
        self.replace(records);
        before - self.records.len()
    }
}

/// Record list edits applied while an action runs.
pub fn remove_path(records: &mut Vec<ResultRecord>, path: &Path) {
    records.retain(|record| !record.references(path));
}

pub fn move_path(records: &mut Vec<ResultRecord>, from: &Path, to: &Path) {
    for record in records.iter_mut() {
        for image in images_mut(record) {
            if image.path == from {
                image.path = to.to_path_buf();
            }
        }
    }
    records.retain(|record| !is_degenerate(record));
}
