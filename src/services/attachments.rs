//! Attachment Builder

use crate::models::{Attachment, ImageAsset};

/// Content-id of the image at `index` within a run
pub fn content_id(index: usize) -> String {
    format!("img-{}", index)
}

/// Turn the run's uploaded images into inline attachments, `img-0` first.
pub fn build_inline_attachments(images: Vec<ImageAsset>) -> Vec<Attachment> {
    images
        .into_iter()
        .enumerate()
        .map(|(index, image)| {
            let content_type: mime::Mime =
                mime_guess::from_path(&image.original_filename).first_or_octet_stream();

            Attachment::inline(
                content_id(index),
                image.original_filename,
                content_type.essence_str(),
                image.bytes,
            )
        })
        .collect()
}
