//! Options records exchanged with the engine, plus their persisted form.

pub mod advanced;
pub mod compare;
pub mod defect;
pub mod document;
pub mod flat;
pub mod paths;
pub mod search;

pub use advanced::AdvancedOptions;
pub use compare::{AlgorithmComparing, CompareOptions};
pub use defect::DefectOptions;
pub use document::ProfileStore;
pub use flat::{FlatOptions, OptionsType};
pub use paths::{PathEntry, PathList, PathRole, MAX_PATH_EX};
pub use search::SearchOptions;

/// Every options category together with the four path lists.
///
/// Edits happen on a clone; the clone replaces the committed value only when
/// the user confirms, so cancelling never touches the original.
#[derive(Debug, Clone, PartialEq)]
pub struct CoreOptions {
    pub search: SearchOptions,
    pub compare: CompareOptions,
    pub defect: DefectOptions,
    pub advanced: AdvancedOptions,
    pub search_paths: Vec<PathEntry>,
    pub ignore_paths: Vec<PathEntry>,
    pub valid_paths: Vec<PathEntry>,
    pub delete_paths: Vec<PathEntry>,
}

impl CoreOptions {
    pub fn paths(&self, role: PathRole) -> &[PathEntry] {
        match role {
            PathRole::Search => &self.search_paths,
            PathRole::Ignore => &self.ignore_paths,
            PathRole::Valid => &self.valid_paths,
            PathRole::Delete => &self.delete_paths,
        }
    }

    fn paths_mut(&mut self, role: PathRole) -> &mut Vec<PathEntry> {
        match role {
            PathRole::Search => &mut self.search_paths,
            PathRole::Ignore => &mut self.ignore_paths,
            PathRole::Valid => &mut self.valid_paths,
            PathRole::Delete => &mut self.delete_paths,
        }
    }

    pub fn path_list(&self, role: PathRole) -> PathList {
        PathList::new(role, self.paths(role).to_vec())
    }

    pub fn set_path_list(&mut self, list: PathList) {
        let role = list.role();
        *self.paths_mut(role) = list.into_entries();
    }

    /// Flat record for one category, as pushed to the engine.
    pub fn flat_bytes(&self, kind: OptionsType) -> Vec<u8> {
        match kind {
            OptionsType::Search => self.search.to_bytes(),
            OptionsType::Compare => self.compare.to_bytes(),
            OptionsType::Defect => self.defect.to_bytes(),
            OptionsType::Advanced => self.advanced.to_bytes(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CoreOptions {
        CoreOptions {
            search: SearchOptions::default(),
            compare: CompareOptions::default(),
            defect: DefectOptions::default(),
            advanced: AdvancedOptions::default(),
            search_paths: vec![PathEntry::new("/photos")],
            ignore_paths: vec![PathEntry::new("/photos/tmp")],
            valid_paths: Vec::new(),
            delete_paths: Vec::new(),
        }
    }

    #[test]
    fn test_clone_equals_original() {
        let options = sample();
        assert_eq!(options.clone(), options);
    }

    #[test]
    fn test_single_field_edit_breaks_equality() {
        let original = sample();
        let edits: Vec<Box<dyn Fn(&mut CoreOptions)>> = vec![
            Box::new(|o: &mut CoreOptions| o.search.hidden = !o.search.hidden),
            Box::new(|o: &mut CoreOptions| o.search.jpeg = !o.search.jpeg),
            Box::new(|o: &mut CoreOptions| o.search.bmp = !o.search.bmp),
            Box::new(|o: &mut CoreOptions| o.search.gif = !o.search.gif),
            Box::new(|o: &mut CoreOptions| o.search.png = !o.search.png),
            Box::new(|o: &mut CoreOptions| o.search.tiff = !o.search.tiff),
            Box::new(|o: &mut CoreOptions| o.search.tga = !o.search.tga),
            Box::new(|o: &mut CoreOptions| o.search.icon = !o.search.icon),
            Box::new(|o: &mut CoreOptions| o.search.dds = !o.search.dds),
            Box::new(|o: &mut CoreOptions| o.search.webp = !o.search.webp),
            Box::new(|o: &mut CoreOptions| o.compare.check_on_equality = !o.compare.check_on_equality),
            Box::new(|o: &mut CoreOptions| o.compare.transformed_image = !o.compare.transformed_image),
            Box::new(|o: &mut CoreOptions| o.compare.size_control = !o.compare.size_control),
            Box::new(|o: &mut CoreOptions| o.compare.type_control = !o.compare.type_control),
            Box::new(|o: &mut CoreOptions| o.compare.ratio_control = !o.compare.ratio_control),
            Box::new(|o: &mut CoreOptions| o.compare.threshold_difference += 1),
            Box::new(|o: &mut CoreOptions| o.compare.minimal_image_size += 1),
            Box::new(|o: &mut CoreOptions| o.compare.maximal_image_size += 1),
            Box::new(|o: &mut CoreOptions| {
                o.compare.compare_inside_one_folder = !o.compare.compare_inside_one_folder
            }),
            Box::new(|o: &mut CoreOptions| {
                o.compare.compare_inside_one_search_path =
                    !o.compare.compare_inside_one_search_path
            }),
            Box::new(|o: &mut CoreOptions| o.compare.algorithm_comparing = AlgorithmComparing::Ssim),
            Box::new(|o: &mut CoreOptions| o.compare.ssim_threshold += 0.001),
            Box::new(|o: &mut CoreOptions| o.defect.check_on_defect = !o.defect.check_on_defect),
            Box::new(|o: &mut CoreOptions| o.defect.check_on_blockiness = !o.defect.check_on_blockiness),
            Box::new(|o: &mut CoreOptions| o.defect.blockiness_threshold += 1),
            Box::new(|o: &mut CoreOptions| {
                o.defect.check_on_blockiness_only_not_jpeg =
                    !o.defect.check_on_blockiness_only_not_jpeg
            }),
            Box::new(|o: &mut CoreOptions| o.defect.check_on_blurring = !o.defect.check_on_blurring),
            Box::new(|o: &mut CoreOptions| o.defect.blurring_threshold += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.mistake_database = !o.advanced.mistake_database),
            Box::new(|o: &mut CoreOptions| o.advanced.ratio_resolution += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.compare_thread_count += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.collect_thread_count += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.reduced_image_size += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.undo_queue_size += 1),
            Box::new(|o: &mut CoreOptions| o.advanced.result_count_max -= 1),
            Box::new(|o: &mut CoreOptions| o.advanced.ignore_frame_width += 1),
            Box::new(|o: &mut CoreOptions| o.search_paths[0].enable_sub_folder = false),
            Box::new(|o: &mut CoreOptions| o.ignore_paths.clear()),
            Box::new(|o: &mut CoreOptions| o.valid_paths.push(PathEntry::new("/keep"))),
            Box::new(|o: &mut CoreOptions| o.delete_paths.push(PathEntry::new("/trash"))),
        ];

        for (i, edit) in edits.iter().enumerate() {
            let mut copy = original.clone();
            edit(&mut copy);
            assert_ne!(copy, original, "edit #{} went unnoticed", i);
        }
    }

    #[test]
    fn test_path_list_round_trip() {
        let mut options = sample();
        let mut list = options.path_list(PathRole::Search);
        list.add(PathEntry::new("/more"));
        options.set_path_list(list);
        assert_eq!(options.search_paths.len(), 2);
    }

    #[test]
    fn test_flat_bytes_per_category() {
        let options = sample();
        for kind in OptionsType::ALL {
            assert!(!options.flat_bytes(kind).is_empty());
        }
        assert_eq!(
            SearchOptions::from_bytes(&options.flat_bytes(OptionsType::Search)).unwrap(),
            options.search
        );
    }
}
