use crate::Config;
use crate::media::MediaStoreConfig;
use crate::rsvp::RsvpStoreConfig;
use crate::story::{VideoSource, youtube_embed_url};
use crate::templating::{FOOTER_TEMPLATE, HEADER_TEMPLATE};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum StartupCheckError {
    #[error("Static files directory does not exist: {0}")]
    StaticDirectoryMissing(String),

    #[error("Templates directory does not exist: {0}")]
    TemplateDirectoryMissing(String),

    #[error("Required template missing: {0}")]
    RequiredTemplateMissing(String),

    #[error("Gallery name used more than once: {0}")]
    DuplicateGallery(String),

    #[error("Gallery '{0}' has an empty name or namespace")]
    GalleryIncomplete(String),

    #[error("Gallery '{0}' must show at least one item per batch")]
    EmptyBatch(String),

    #[error("Gallery '{0}' accepts files larger than the upload body limit")]
    SizeLimitAboveBodyLimit(String),

    #[error("Media store credentials missing: {0}")]
    MediaCredentialsMissing(String),

    #[error("Database credentials missing: {0}")]
    DatabaseCredentialsMissing(String),
}

const REQUIRED_TEMPLATES: [&str; 3] = [
    "index.html.liquid",
    "gallery.html.liquid",
    "media_detail.html.liquid",
];

pub async fn perform_startup_checks(config: &Config) -> Result<(), Vec<StartupCheckError>> {
    let mut errors = Vec::new();

    info!("Performing startup checks...");

    let static_dir = &config.static_files.directory;
    if !static_dir.exists() {
        error!("Static files directory does not exist: {:?}", static_dir);
        errors.push(StartupCheckError::StaticDirectoryMissing(
            static_dir.display().to_string(),
        ));
    } else {
        info!("Static files directory exists: {:?}", static_dir);
    }

    let templates_dir = &config.templates.directory;
    if !templates_dir.exists() {
        error!("Templates directory does not exist: {:?}", templates_dir);
        errors.push(StartupCheckError::TemplateDirectoryMissing(
            templates_dir.display().to_string(),
        ));
    } else {
        for template in REQUIRED_TEMPLATES {
            if !templates_dir.join(template).exists() {
                error!("Required template missing: {}", template);
                errors.push(StartupCheckError::RequiredTemplateMissing(
                    template.to_string(),
                ));
            }
        }
        for partial in [HEADER_TEMPLATE, FOOTER_TEMPLATE] {
            if !templates_dir.join(partial).exists() {
                warn!("Partial {} is missing; pages render without it", partial);
            }
        }
    }

    let mut seen = HashSet::new();
    for gallery in &config.galleries {
        if gallery.name.trim().is_empty() || gallery.namespace.trim().is_empty() {
            errors.push(StartupCheckError::GalleryIncomplete(gallery.title.clone()));
            continue;
        }
        if !seen.insert(gallery.name.as_str()) {
            errors.push(StartupCheckError::DuplicateGallery(gallery.name.clone()));
        }
        if gallery.window.initial_batch == 0 || gallery.window.increment == 0 {
            errors.push(StartupCheckError::EmptyBatch(gallery.name.clone()));
        }
        if gallery.uploads_enabled {
            let largest = gallery
                .size_limits
                .image_bytes
                .max(gallery.size_limits.video_bytes);
            if largest >= config.uploads.body_limit_bytes as u64 {
                errors.push(StartupCheckError::SizeLimitAboveBodyLimit(
                    gallery.name.clone(),
                ));
            }
        }
        info!(
            "Gallery '{}' -> namespace '{}' (batch {}+{})",
            gallery.name, gallery.namespace, gallery.window.initial_batch, gallery.window.increment
        );
    }

    for entry in &config.story.timeline {
        if let Some(video) = &entry.video
            && video.source == VideoSource::Youtube
            && youtube_embed_url(&video.url).is_none()
        {
            warn!(
                "Timeline entry '{}' has a YouTube link the player can't embed: {}",
                entry.title, video.url
            );
        }
    }
    info!(
        "Story: {} timeline entries, {} scheduled events",
        config.story.timeline.len(),
        config.schedule.len()
    );

    match &config.media {
        MediaStoreConfig::Cloudinary(cloudinary) => {
            let missing: Vec<&str> = [
                ("cloud_name", &cloudinary.cloud_name),
                ("api_key", &cloudinary.api_key),
                ("api_secret", &cloudinary.api_secret),
                ("upload_preset", &cloudinary.upload_preset),
            ]
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
            .collect();
            if !missing.is_empty() {
                errors.push(StartupCheckError::MediaCredentialsMissing(missing.join(", ")));
            }
        }
        MediaStoreConfig::Memory(_) => {
            warn!("Using the in-memory media store; uploads are lost on restart");
        }
    }

    match &config.database {
        RsvpStoreConfig::Supabase(supabase) => {
            if supabase.url.trim().is_empty() || supabase.service_role_key.trim().is_empty() {
                errors.push(StartupCheckError::DatabaseCredentialsMissing(
                    "url and service_role_key are required".to_string(),
                ));
            }
        }
        RsvpStoreConfig::Memory => {
            warn!("Using the in-memory RSVP store; responses are lost on restart");
        }
    }

    if errors.is_empty() {
        info!("All startup checks passed");
        Ok(())
    } else {
        error!("Startup checks failed with {} errors", errors.len());
        Err(errors)
    }
}
