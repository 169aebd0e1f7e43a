//! Data models for inde entities.
//!
//! - `ReferenceCodeItem`: normalised system code entries used by form dropdowns
//! - `UserInfo` and the login/registration/profile request types
//! - Board types: `Notice`, `FaqItem`, `Inquiry`, `Page`

pub mod board;
pub mod syscode;
pub mod user;

pub use board::{FaqItem, Inquiry, InquiryDraft, ListQuery, Notice, NoticeDraft, NoticeUpdate, Page};
pub use syscode::{
    display_name, parse_code_envelope, selectable_options, ReferenceCodeItem, POSITION_PARENT,
    REGION_DOMESTIC_PARENT, REGION_FOREIGN_PARENT, SYSCODE_PARENT_IDS,
};
pub use user::{
    JoinedVia, LoginRequest, LoginResponse, PostLoginRoute, ProfileCompleteRequest,
    ProfileCompleteResponse, RegionType, RegisterRequest, RegisterResponse, SocialProvider, UserInfo,
};
