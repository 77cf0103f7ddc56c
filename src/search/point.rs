// polar-cartgrid/src/search/point.rs

/// One cell of a quadrant search matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct SearchPoint {
    pub level: u32,
    pub el_dist: u32,
    pub az_dist: u32,
    /// Index into the volume's rays.
    pub ray: Option<usize>,
    pub ray_el: f64,
    pub ray_az: f64,
    /// Angles used by the weights; synthesized for a missing quadrant.
    pub interp_el: f64,
    pub interp_az: f64,
}

impl SearchPoint {
    pub fn seeded(ray: usize, ray_el: f64, ray_az: f64) -> Self {
        Self {
            ray: Some(ray),
            ray_el,
            ray_az,
            ..Self::default()
        }
    }

    pub fn has_ray(&self) -> bool {
        self.ray.is_some()
    }

    /// Carries the ray and distance counters of `source` into a new cell.
    pub(crate) fn seeded_from(source: &SearchPoint) -> Self {
        Self {
            level: source.level,
            el_dist: source.el_dist,
            az_dist: source.az_dist,
            ray: source.ray,
            ray_el: source.ray_el,
            ray_az: source.ray_az,
            ..Self::default()
        }
    }
}

/// Direction of the bracketing ray relative to the query point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    LowerLeft,
    UpperLeft,
    LowerRight,
    UpperRight,
}

impl Quadrant {
    pub const ALL: [Quadrant; 4] = [
        Quadrant::LowerLeft,
        Quadrant::UpperLeft,
        Quadrant::LowerRight,
        Quadrant::UpperRight,
    ];

    /// Elevation direction in which rays are propagated: a ray below the
    /// query point is carried upward.
    pub fn el_step(&self) -> i64 {
        match self {
            Quadrant::LowerLeft | Quadrant::LowerRight => 1,
            Quadrant::UpperLeft | Quadrant::UpperRight => -1,
        }
    }

    pub fn az_step(&self) -> i64 {
        match self {
            Quadrant::LowerLeft | Quadrant::UpperLeft => 1,
            Quadrant::LowerRight | Quadrant::UpperRight => -1,
        }
    }

    pub fn is_lower(&self) -> bool {
        self.el_step() > 0
    }

    pub fn is_left(&self) -> bool {
        self.az_step() > 0
    }

    pub fn index(&self) -> usize {
        match self {
            Quadrant::LowerLeft => 0,
            Quadrant::UpperLeft => 1,
            Quadrant::LowerRight => 2,
            Quadrant::UpperRight => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::LowerLeft => "LL",
            Quadrant::UpperLeft => "UL",
            Quadrant::LowerRight => "LR",
            Quadrant::UpperRight => "UR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps() {
        assert_eq!(Quadrant::LowerLeft.el_step(), 1);
        assert_eq!(Quadrant::LowerLeft.az_step(), 1);
        assert_eq!(Quadrant::UpperRight.el_step(), -1);
        assert_eq!(Quadrant::UpperRight.az_step(), -1);
        assert!(Quadrant::LowerRight.is_lower());
        assert!(!Quadrant::LowerRight.is_left());
        for (i, quadrant) in Quadrant::ALL.iter().enumerate() {
            assert_eq!(quadrant.index(), i);
        }
    }
}
