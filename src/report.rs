//! Plain-text result report: summary fields first, then one line per
//! block in declaration order.

use std::io::Write;

use crate::{anneal::Solution, floorplan::Floorplan};

pub fn write_report<W: Write>(
    w: &mut W,
    sol: &Solution,
    plan: &Floorplan,
) -> std::io::Result<()> {
    writeln!(w, "{}", sol.cost)?;
    writeln!(w, "{}", sol.hpwl)?;
    writeln!(w, "{}", sol.area)?;
    writeln!(w, "{} {}", sol.dims.width, sol.dims.height)?;
    writeln!(w, "{}", sol.elapsed.as_secs())?;
    for b in plan.blocks() {
        writeln!(
            w,
            "{} {} {} {} {}",
            b.name(),
            b.left_x(),
            b.bottom_y(),
            b.right_x(),
            b.top_y()
        )?;
    }
    Ok(())
}
