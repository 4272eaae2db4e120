//! View models driven by the command line front end. Each one binds user
//! actions to resource client calls and keeps the results around.

pub mod admin;
pub mod guide_detail;
pub mod home;
pub mod notice;

pub use admin::{AdminTab, AdminView};
pub use guide_detail::GuideDetailView;
pub use home::{HomeView, LoginForm};
pub use notice::{Notice, NoticeBoard, NoticeKind};
