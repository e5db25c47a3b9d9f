//! Splitting a deck's slides into four-slide respondent blocks.

use crate::error::{Error, Result};
use crate::types::Slide;

/// Slides per respondent: one info slide plus three outcome slides.
pub const BLOCK_SIZE: usize = 4;

/// Four consecutive slides describing one respondent.
#[derive(Debug, Clone, Copy)]
pub struct RespondentBlock<'a> {
    pub info: &'a Slide,
    pub fixed: &'a Slide,
    pub waiting: &'a Slide,
    pub not_fixed: &'a Slide,
}

/// Partition slides into respondent blocks.
///
/// When the count is not a multiple of four the first slide is treated as an
/// introduction and dropped. If the remainder still does not divide evenly
/// the deck is rejected.
pub fn group_slides(slides: &[Slide]) -> Result<Vec<RespondentBlock<'_>>> {
    let slides = if slides.len() % BLOCK_SIZE != 0 {
        log::debug!("Dropping intro slide ({} slides total)", slides.len());
        &slides[1..]
    } else {
        slides
    };

    if slides.len() % BLOCK_SIZE != 0 {
        return Err(Error::RaggedSlideCount {
            total: slides.len() + 1,
            remaining: slides.len(),
        });
    }

    Ok(slides
        .chunks_exact(BLOCK_SIZE)
        .map(|chunk| RespondentBlock {
            info: &chunk[0],
            fixed: &chunk[1],
            waiting: &chunk[2],
            not_fixed: &chunk[3],
        })
        .collect())
}
