use crate::error::{Error, Result};
use crate::path::Path;
use crate::tables::glyf::{GlyfTable, GlyphData, Outline, Point};

/// Maximum nesting of composite glyphs.
const MAX_COMPONENT_DEPTH: usize = 16;

/// Maximum number of component references resolved for a single glyph, counting every level.
const MAX_COMPONENTS: usize = 4096;

/// A TrueType glyph with its outline and metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub(crate) id: u16,
    /// Code points the glyph was looked up for. Empty for glyphs requested by id.
    pub(crate) code_points: Vec<u32>,
    pub(crate) data: GlyphData,
    /// Contours with composite components resolved.
    pub(crate) contours: Vec<Vec<Point>>,
    pub(crate) advance_width: u16,
    pub(crate) name: Option<String>,
}

impl Glyph {
    pub(crate) fn new(
        glyf: &GlyfTable,
        id: u16,
        data: GlyphData,
        advance_width: u16,
        name: Option<String>,
    ) -> Result<Self> {
        let mut budget = MAX_COMPONENTS;
        let contours = contours(glyf, &data, 0, &mut budget)?;
        Ok(Glyph {
            id,
            code_points: Vec::new(),
            data,
            contours,
            advance_width,
            name,
        })
    }

    pub fn id(&self) -> u16 {
        self.id
    }

    pub fn code_points(&self) -> &[u32] {
        &self.code_points
    }

    pub fn contours(&self) -> &[Vec<Point>] {
        &self.contours
    }

    pub fn path(&self) -> Path {
        Path::from_contours(&self.contours)
    }

    /// Bounding box `[x_min, y_min, x_max, y_max]` as declared by the glyph description.
    pub fn bbox(&self) -> [i16; 4] {
        self.data.bbox()
    }

    pub fn advance_width(&self) -> u16 {
        self.advance_width
    }

    /// Glyph name from the `post` table, if it has one.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_composite(&self) -> bool {
        self.data.is_composite()
    }
}

fn contours(
    glyf: &GlyfTable,
    data: &GlyphData,
    depth: usize,
    budget: &mut usize,
) -> Result<Vec<Vec<Point>>> {
    match data.outline() {
        Outline::Empty => Ok(Vec::new()),
        Outline::Simple(points) => Ok(split_contours(points)),
        Outline::Composite(components) => {
            if depth >= MAX_COMPONENT_DEPTH {
                return Err(Error::invalid("composite glyphs nested too deep"));
            }
            let mut result = Vec::new();
            for component in components {
                *budget = budget
                    .checked_sub(1)
                    .ok_or_else(|| Error::invalid("composite glyph has too many components"))?;
                let data = match glyf.glyph(component.glyph_id)? {
                    Some(data) => data,
                    None => {
                        log::warn!("missing component glyph {}", component.glyph_id);
                        continue;
                    }
                };
                for contour in contours(glyf, &data, depth + 1, budget)? {
                    result.push(
                        contour
                            .into_iter()
                            .map(|point| {
                                let (x, y) = component.transform(point.x, point.y);
                                Point { x, y, ..point }
                            })
                            .collect(),
                    );
                }
            }
            Ok(result)
        }
    }
}

fn split_contours(points: &[Point]) -> Vec<Vec<Point>> {
    let mut contours = Vec::new();
    let mut current = Vec::new();
    for point in points {
        current.push(*point);
        if point.end_contour {
            contours.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        contours.push(current);
    }
    contours
}
