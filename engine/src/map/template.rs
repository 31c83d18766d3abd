use super::{CoverHeight, GameMap, Tile};
use crate::mission::MissionError;
use crate::types::GridPos;

// ============================================================================
// Template Parsing
// ============================================================================

// Something a template glyph asks the mission to spawn on top of the tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateFeature {
    Door { locked: bool },
    Terminal,
    Hazard,
}

// Result of building a map: the grid plus everything the glyphs implied
#[derive(Debug, Clone)]
pub struct MapBuild {
    pub map: GameMap,
    pub entry_zone: Vec<GridPos>,
    pub features: Vec<(GridPos, TemplateFeature)>,
}

// Parse row strings into a map.
//
// `.` floor, `#` wall, `E` entry-zone floor, `D` door, `L` locked door, `T` terminal, `X` hazard,
// `-`/`=`/`+` low/half/high cover props, space void. Short rows are padded with void.
pub fn parse_template(rows: &[String]) -> Result<MapBuild, MissionError> {
    let height = rows.len();
    let width = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
    if width == 0 || height == 0 {
        return Err(MissionError::EmptyMap);
    }

    let mut map = GameMap::new(width as i32, height as i32);
    let mut entry_zone = Vec::new();
    let mut features = Vec::new();

    for (y, row) in rows.iter().enumerate() {
        for (x, glyph) in row.chars().enumerate() {
            let pos = GridPos::new(x as i32, y as i32);
            let tile = match glyph {
                '.' => Tile::floor(),
                '#' => Tile::wall(),
                ' ' => Tile::default(),
                'E' => {
                    entry_zone.push(pos);
                    Tile::floor()
                }
                'D' | 'L' => {
                    features.push((pos, TemplateFeature::Door { locked: glyph == 'L' }));
                    Tile::floor()
                }
                'T' => {
                    features.push((pos, TemplateFeature::Terminal));
                    Tile::floor()
                }
                'X' => {
                    features.push((pos, TemplateFeature::Hazard));
                    Tile::floor()
                }
                other => match CoverHeight::from_glyph(other) {
                    Some(height) => Tile::prop(height),
                    None => return Err(MissionError::UnknownGlyph { glyph: other, x, y }),
                },
            };
            map.set_tile(pos, tile);
        }
    }

    map.rebuild_cover();

    Ok(MapBuild {
        map,
        entry_zone,
        features,
    })
}
