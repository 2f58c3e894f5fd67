//! User-agent classification for access logs
//!
//! Plain substring heuristics on the lower-cased header. Pure and infallible:
//! anything unrecognised falls through to `Other` / `Desktop`.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Browser {
    Firefox,
    Chrome,
    Safari,
    Edge,
    Opera,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Os {
    Windows,
    MacOs,
    Linux,
    Android,
    Ios,
    Other,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Firefox => "Firefox",
            Browser::Chrome => "Chrome",
            Browser::Safari => "Safari",
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::Other => "Other",
        }
    }
}

impl Os {
    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "Windows",
            Os::MacOs => "macOS",
            Os::Linux => "Linux",
            Os::Android => "Android",
            Os::Ios => "iOS",
            Os::Other => "Other",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Browser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub device: DeviceType,
    pub browser: Browser,
    pub os: Os,
}

pub fn parse_user_agent(user_agent: &str) -> UserAgentInfo {
    let ua = user_agent.to_lowercase();
    let has = |needle: &str| ua.contains(needle);

    let device = if has("mobile") || has("android") || has("iphone") {
        DeviceType::Mobile
    } else if has("tablet") || has("ipad") {
        DeviceType::Tablet
    } else {
        DeviceType::Desktop
    };

    let browser = if has("firefox") {
        Browser::Firefox
    } else if has("chrome") && !has("edg") {
        Browser::Chrome
    } else if has("safari") && !has("chrome") {
        Browser::Safari
    } else if has("edg") {
        Browser::Edge
    } else if has("opera") {
        Browser::Opera
    } else {
        Browser::Other
    };

    // "linux" is checked before "android", so Android agents report Linux
    let os = if has("windows") {
        Os::Windows
    } else if has("mac os") {
        Os::MacOs
    } else if has("linux") {
        Os::Linux
    } else if has("android") {
        Os::Android
    } else if has("iphone") || has("ipad") {
        Os::Ios
    } else {
        Os::Other
    };

    UserAgentInfo {
        device,
        browser,
        os,
    }
}
