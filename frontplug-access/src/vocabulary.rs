//! Static ACL vocabulary
//!
//! The only action and parameter names that may appear in a request context.
//! Anything else found in the configuration store is ignored.

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Operations an identity may or may not perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AclAction {
    Upload,
    Download,
    Share,
    Delete,
    Rename,
    CreateFolder,
    CopyMove,
    PublicLink,
}

impl AclAction {
    pub const ALL: [AclAction; 8] = [
        AclAction::Upload,
        AclAction::Download,
        AclAction::Share,
        AclAction::Delete,
        AclAction::Rename,
        AclAction::CreateFolder,
        AclAction::CopyMove,
        AclAction::PublicLink,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AclAction::Upload => "upload",
            AclAction::Download => "download",
            AclAction::Share => "share",
            AclAction::Delete => "delete",
            AclAction::Rename => "rename",
            AclAction::CreateFolder => "create_folder",
            AclAction::CopyMove => "copy_move",
            AclAction::PublicLink => "public_link",
        }
    }
}

impl fmt::Display for AclAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AclAction::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| format!("Unknown ACL action: {}", s))
    }
}

/// Identity-dependent configuration values exposed to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AclParameter {
    ApplicationTitle,
    DefaultStartRepository,
    UploadMaxSize,
    ShareExpirationDays,
    ShowHiddenFiles,
    Theme,
}

impl AclParameter {
    pub const ALL: [AclParameter; 6] = [
        AclParameter::ApplicationTitle,
        AclParameter::DefaultStartRepository,
        AclParameter::UploadMaxSize,
        AclParameter::ShareExpirationDays,
        AclParameter::ShowHiddenFiles,
        AclParameter::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AclParameter::ApplicationTitle => "application_title",
            AclParameter::DefaultStartRepository => "default_start_repository",
            AclParameter::UploadMaxSize => "upload_max_size",
            AclParameter::ShareExpirationDays => "share_expiration_days",
            AclParameter::ShowHiddenFiles => "show_hidden_files",
            AclParameter::Theme => "theme",
        }
    }

    /// Plugin id and key holding the server-wide default
    pub fn plugin_key(&self) -> (&'static str, &'static str) {
        match self {
            AclParameter::ApplicationTitle => ("core.pydio", "APPLICATION_TITLE"),
            AclParameter::DefaultStartRepository => ("core.pydio", "DEFAULT_START_REPOSITORY"),
            AclParameter::UploadMaxSize => ("uploader.html", "UPLOAD_MAX_SIZE"),
            AclParameter::ShareExpirationDays => ("action.share", "DEFAULT_EXPIRATION"),
            AclParameter::ShowHiddenFiles => ("core.pydio", "SHOW_HIDDEN_FILES"),
            AclParameter::Theme => ("gui.ajax", "GUI_THEME"),
        }
    }
}

impl fmt::Display for AclParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AclParameter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AclParameter::ALL
            .into_iter()
            .find(|parameter| parameter.as_str() == s)
            .ok_or_else(|| format!("Unknown ACL parameter: {}", s))
    }
}
