use endless_common::Viewport;
use endless_scene::TargetId;
use std::fmt;
use std::str::FromStr;

/// How the off-screen target and primary aspect follow the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResizePolicy {
    /// Size and aspect are taken once at mount and never updated.
    Fixed,
    /// The target is reallocated and the aspect recomputed on every resize.
    #[default]
    Track,
}

impl FromStr for ResizePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed" => Ok(Self::Fixed),
            "track" => Ok(Self::Track),
            other => Err(format!("unknown resize policy {other:?} (expected fixed or track)")),
        }
    }
}

impl fmt::Display for ResizePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fixed => "fixed",
            Self::Track => "track",
        })
    }
}

/// Off-screen color buffer descriptor.
///
/// Backends own the actual texture and reallocate it when `generation`
/// changes; the `id` stays the same for the target's whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderTarget {
    pub id: TargetId,
    pub width: u32,
    pub height: u32,
    pub generation: u64,
}

impl RenderTarget {
    /// Sized to `viewport`; a zero-area viewport falls back to 1×1.
    pub fn allocate(id: TargetId, viewport: Viewport) -> Self {
        if viewport.is_degenerate() {
            tracing::warn!(
                "viewport {}x{} has no area, render target falls back to at least 1x1",
                viewport.width,
                viewport.height
            );
        }
        let size = viewport.at_least_one();
        tracing::debug!("render target {:?} allocated at {}x{}", id, size.width, size.height);
        Self {
            id,
            width: size.width,
            height: size.height,
            generation: 1,
        }
    }

    /// Resize to `viewport`. Returns whether the size changed.
    pub fn reallocate(&mut self, viewport: Viewport) -> bool {
        let size = viewport.at_least_one();
        if size == self.size() {
            return false;
        }
        self.width = size.width;
        self.height = size.height;
        self.generation += 1;
        tracing::debug!(
            "render target {:?} reallocated at {}x{} (generation {})",
            self.id,
            self.width,
            self.height,
            self.generation
        );
        true
    }

    pub fn size(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_matches_viewport() {
        let t = RenderTarget::allocate(TargetId(0), Viewport::new(1280, 720));
        assert_eq!(t.size(), Viewport::new(1280, 720));
        assert_eq!(t.generation, 1);
    }

    #[test]
    fn zero_area_falls_back() {
        let t = RenderTarget::allocate(TargetId(0), Viewport::new(0, 0));
        assert_eq!(t.size(), Viewport::new(1, 1));
    }

    #[test]
    fn reallocate_only_on_change() {
        let mut t = RenderTarget::allocate(TargetId(3), Viewport::new(800, 600));
        assert!(!t.reallocate(Viewport::new(800, 600)));
        assert!(t.reallocate(Viewport::new(1024, 600)));
        assert_eq!(t.generation, 2);
        assert_eq!(t.id, TargetId(3));
    }

    #[test]
    fn policy_parses() {
        assert_eq!("fixed".parse::<ResizePolicy>().unwrap(), ResizePolicy::Fixed);
        assert_eq!("track".parse::<ResizePolicy>().unwrap(), ResizePolicy::Track);
        assert!("stretch".parse::<ResizePolicy>().is_err());
        assert_eq!(ResizePolicy::default().to_string(), "track");
    }
}
