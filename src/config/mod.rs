use std::env;
use std::path::PathBuf;

use ratatui::style::palette::tailwind;

pub const PALETTES: [tailwind::Palette; 4] = [
    tailwind::BLUE,
    tailwind::EMERALD,
    tailwind::INDIGO,
    tailwind::RED,
];

pub const INFO_TEXT: [&str; 2] = [
    "(Esc) quit | (Tab) focus | (↑/↓) sidebar row | (←/→) change | (Enter) select | (f) favorite",
    "([/]) from ± day | ({/}) to ± day | (/) date range | (r) refetch | (Shift + →/←) cycle color",
];

pub const POLL_DURATION_MS: u64 = 50;
pub const ERROR_POPUP_DURATION_MS: u64 = 1500;

pub const DEFAULT_INSTRUMENT: &str = "BTC-USDT-SWAP";
pub const TRACKED_INSTRUMENTS: [&str; 4] = [
    "BTC-USDT-SWAP",
    "ETH-USDT-SWAP",
    "SOL-USDT-SWAP",
    "LTC-USDT-SWAP",
];

/// Default range start, `to` defaults to today.
pub const DEFAULT_RANGE_FROM: (i32, u32, u32) = (2024, 10, 15);

pub const DEFAULT_FUNDING_INTERVAL_HOURS: i64 = 8;
pub const HOUR_MS: i64 = 60 * 60 * 1000;
pub const TRAILING_WINDOW_DAYS: usize = 7;

pub const DAY_LABEL_FORMAT: &str = "%d/%m/%Y";
pub const FETCH_ERROR_MESSAGE: &str = "Failed to load funding rate history.";
pub const NO_DATA_MESSAGE: &str = "No data available for the selected date range.";

const DEFAULT_STATE_FILE: &str = "filters.json";
const DEFAULT_LOG_FILE: &str = "/tmp/funding_dash.log";

/// Venue credentials attached to every signed request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub api_key: String,
    pub secret_key: String,
    pub passphrase: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub credentials: Credentials,
    pub state_path: PathBuf,
    pub log_path: PathBuf,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            base_url: env_or("OKX_BASE_URL", crate::third_party::okx::api_path::OKX_API_URL),
            credentials: Credentials {
                api_key: env_or("OKX_API_KEY", ""),
                secret_key: env_or("OKX_SECRET_KEY", ""),
                passphrase: env_or("OKX_PASSPHRASE", ""),
            },
            state_path: PathBuf::from(env_or("FUNDING_DASH_STATE", DEFAULT_STATE_FILE)),
            log_path: PathBuf::from(env_or("FUNDING_DASH_LOG", DEFAULT_LOG_FILE)),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
