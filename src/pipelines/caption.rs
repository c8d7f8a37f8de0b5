use crate::error::CookmateError;
use crate::extract::parse_ingredients;
use crate::media::{self, ImageSource};
use crate::model::Ingredient;
use crate::providers::{GenerationRequest, GenerativeModel, INGREDIENT_CAPTION_PROMPT};
use log::{debug, info};

/// Identify the ingredients visible in a photo
///
/// This pipeline:
/// 1. Loads the image and encodes it as base64
/// 2. Sends it to the model together with the caption prompt
/// 3. Extracts the `ingredients` list from the answer
///
/// There is no retry; on failure the caller asks the user to try again.
pub async fn identify_ingredients(
    model: &dyn GenerativeModel,
    image: &ImageSource,
) -> Result<Vec<Ingredient>, CookmateError> {
    let inline = media::load(image).await?;
    debug!(
        "Identifying ingredients with {} ({})",
        model.provider_name(),
        inline.mime_type
    );

    let request = GenerationRequest::new(INGREDIENT_CAPTION_PROMPT).with_image(inline);
    let caption = model.generate(&request).await?;
    debug!("Caption: {}", caption);

    let ingredients = parse_ingredients(&caption)?;
    info!("Identified {} ingredient(s)", ingredients.len());
    Ok(ingredients)
}
