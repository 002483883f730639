mod app;
mod chart;
mod colors;
mod sidebar;
mod tiles;

pub use app::TuiApp;
pub use chart::render_chart;
pub use colors::DashboardColors;
pub use sidebar::{SIDEBAR_WIDTH, SidebarRow, render_sidebar};
pub use tiles::render_tiles;
