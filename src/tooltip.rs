use crate::host::{TooltipId, TooltipLayer};
use crate::images::ImageResolver;
use crate::models::{GlossaryTerm, TooltipContent, TooltipImage};
use std::collections::HashMap;

struct BoundTooltip {
    instance: TooltipId,
    term: GlossaryTerm,
    /// Image shown the last time this tooltip was composed.
    image: Option<TooltipImage>,
}

/// Binds glossary elements to tooltip instances. Content is composed on every
/// show so it always reflects the current image caches.
pub struct TooltipManager {
    layer: Option<Box<dyn TooltipLayer>>,
    bound: HashMap<usize, BoundTooltip>,
}

impl TooltipManager {
    pub fn new(layer: Option<Box<dyn TooltipLayer>>) -> Self {
        if layer.is_none() {
            log::warn!("no tooltip layer available; glossary tooltips are disabled");
        }
        Self {
            layer,
            bound: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.layer.is_some()
    }

    pub fn bound_count(&self) -> usize {
        self.bound.len()
    }

    /// Replaces every existing binding with one per term.
    pub fn bind_all(&mut self, terms: &[GlossaryTerm]) -> usize {
        self.unbind_all();
        for term in terms {
            self.bind(term);
        }
        self.bound.len()
    }

    /// Binds one element, destroying any instance already bound to it.
    pub fn bind(&mut self, term: &GlossaryTerm) {
        let Some(layer) = self.layer.as_mut() else {
            return;
        };
        if let Some(previous) = self.bound.remove(&term.id) {
            layer.destroy(previous.instance);
        }
        let instance = layer.create(term);
        self.bound.insert(
            term.id,
            BoundTooltip {
                instance,
                term: term.clone(),
                image: None,
            },
        );
    }

    pub fn unbind_all(&mut self) {
        let Some(layer) = self.layer.as_mut() else {
            self.bound.clear();
            return;
        };
        for (_, tooltip) in self.bound.drain() {
            layer.destroy(tooltip.instance);
        }
    }

    /// Builds the content for a tooltip about to be shown.
    pub fn compose(
        &mut self,
        element: usize,
        images: &mut ImageResolver,
        chapter: Option<&str>,
    ) -> Option<TooltipContent> {
        let tooltip = self.bound.get_mut(&element)?;

        let image = tooltip.term.image.as_deref().and_then(|raw| {
            let url = images.resolve(raw, chapter)?;
            images.ensure_preloaded(&url);
            let alt = tooltip
                .term
                .image_alt
                .clone()
                .unwrap_or_else(|| tooltip.term.text.clone());
            Some(TooltipImage { url, alt })
        });
        tooltip.image = image.clone();

        Some(TooltipContent {
            text: tooltip.term.tooltip.clone(),
            image,
        })
    }

    /// Handles a click on the tooltip's image: hides the tooltip and returns
    /// the image to open in the viewer.
    pub fn image_clicked(&mut self, element: usize) -> Option<TooltipImage> {
        let tooltip = self.bound.get(&element)?;
        let image = tooltip.image.clone()?;
        if let Some(layer) = self.layer.as_mut() {
            layer.hide(tooltip.instance);
        }
        Some(image)
    }
}
