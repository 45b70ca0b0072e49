pub mod action;
pub mod model;
pub mod status;

pub use action::{
    ActionEnableType, FileType, GlobalActionType, LocalActionType, RenameCurrentType,
    SelectionType, SortType, TargetType,
};
pub use model::{
    DefectRecord, DefectType, DuplPair, ExifInfo, Group, GroupId, HintType, ImageInfo, ImageType,
    ResultRecord, ResultType, TransformType,
};
pub use status::{StateType, StatusSample, ThreadType};
