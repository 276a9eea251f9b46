//! Surface detection: which external application a controller sits on.

use serde::{Deserialize, Serialize};

/// Frame name the CRM gives the embedded softphone.
pub const SOFTPHONE_FRAME_NAME: &str = "sfdcSoftphone";

/// The console application a controller is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// The CRM console: tabs and toasts live here.
    Crm,
    /// The softphone frame: call state and the next-call controls live here.
    Softphone,
    Unknown,
}

/// Widgets attached on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Widgets {
    pub hygiene: bool,
    pub automation: bool,
}

impl Surface {
    /// Classify a page from its host and (possibly empty) frame name.
    #[must_use]
    pub fn detect(host: &str, frame_name: &str) -> Self {
        let host = host.to_ascii_lowercase();
        if host.ends_with(".lightning.force.com") || host.ends_with(".my.salesforce.com") {
            Self::Crm
        } else if host == "app.five9.com" || frame_name == SOFTPHONE_FRAME_NAME {
            Self::Softphone
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn widgets(self) -> Widgets {
        match self {
            Self::Crm => Widgets {
                hygiene: true,
                automation: true,
            },
            Self::Softphone => Widgets {
                hygiene: false,
                automation: true,
            },
            Self::Unknown => Widgets {
                hygiene: false,
                automation: false,
            },
        }
    }
}
