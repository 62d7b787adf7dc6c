pub const TABLE_NAME: &str = "cells_areas";

pub enum Columns {
    CellId,
    AreaId,
}

impl Columns {
    pub fn as_str(&self) -> &'static str {
        match self {
            Columns::CellId => "cell_id",
            Columns::AreaId => "area_id",
        }
    }
}
