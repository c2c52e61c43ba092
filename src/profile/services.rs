use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::repo_types::{ProfileUpdate, User},
    errors::{AppError, AppResult},
    profile::dto::UpdateProfileRequest,
};

pub const BIO_MAX: usize = 500;

pub const UNSUPPORTED_RESUME: &str =
    "File upload failed: Only PDF, DOC, and DOCX files are allowed for resumes.";

pub fn is_valid_linkedin_url(url: &str) -> bool {
    lazy_static! {
        static ref LINKEDIN_RE: Regex =
            Regex::new(r"^(https?://)?(www\.)?linkedin\.com/in/[a-zA-Z0-9_-]+/?$").unwrap();
    }
    LINKEDIN_RE.is_match(url)
}

/// Merge a partial update onto the stored profile.
///
/// An empty `fullName` keeps the current name; the other fields may be
/// cleared by sending an empty value.
pub fn merge_profile(user: &User, req: UpdateProfileRequest) -> AppResult<ProfileUpdate> {
    let full_name = req
        .full_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| user.full_name.clone());

    let bio = req.bio.map(|b| b.trim().to_string()).unwrap_or_else(|| user.bio.clone());
    if bio.chars().count() > BIO_MAX {
        return Err(AppError::validation("Bio cannot be more than 500 characters"));
    }

    let skills = match req.skills {
        Some(s) => s
            .into_vec()
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => user.skills.clone(),
    };

    let linkedin_url = req
        .linkedin_url
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| user.linkedin_url.clone());
    if !linkedin_url.is_empty() && !is_valid_linkedin_url(&linkedin_url) {
        return Err(AppError::validation(
            "Please provide a valid LinkedIn profile URL",
        ));
    }

    let portfolio_url = req
        .portfolio_url
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| user.portfolio_url.clone());

    Ok(ProfileUpdate {
        full_name,
        bio,
        skills,
        linkedin_url,
        portfolio_url,
    })
}

fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "application/pdf" => Some("pdf"),
        "application/msword" => Some("doc"),
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        _ => None,
    }
}

fn ext_from_file_name(file_name: &str) -> Option<&'static str> {
    let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "pdf" => Some("pdf"),
        "doc" => Some("doc"),
        "docx" => Some("docx"),
        _ => None,
    }
}

/// Both the declared content type and the file extension must name a resume format.
/// Returns the extension to store the object under.
pub fn resume_extension(content_type: &str, file_name: &str) -> AppResult<&'static str> {
    match (ext_from_mime(content_type), ext_from_file_name(file_name)) {
        (Some(_), Some(ext)) => Ok(ext),
        _ => {
            warn!(%content_type, %file_name, "rejected resume upload");
            Err(AppError::validation(UNSUPPORTED_RESUME))
        }
    }
}

pub fn resume_key(user_id: Uuid, ext: &str) -> String {
    format!("resumes/{}/{}.{}", user_id, Uuid::new_v4(), ext)
}
