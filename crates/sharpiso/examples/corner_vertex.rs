use sharpiso::{GradSelectionMethod, GridField, ScalarGrid, SharpIsoConfig, SharpVertexLocator};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    let method: GradSelectionMethod = match args.get(1) {
        Some(name) => name.parse()?,
        None => GradSelectionMethod::GradNS,
    };

    // f = max(x - 3.3, y - 3.6, z - 3.4): the zero level set has a corner
    let apex = [3.3, 3.6, 3.4];
    let grid = ScalarGrid::from_fn([8, 8, 8], |p| {
        (p[0] - apex[0]).max(p[1] - apex[1]).max(p[2] - apex[2])
    })?;

    let locator = SharpVertexLocator::new(SharpIsoConfig::from_method(method))?;
    let cube = grid.vertex_index([3, 3, 3]);
    let v = locator.locate(&grid, cube, 0.0)?;

    println!(
        "{}: vertex {:?} from {} samples (rank {}, {:?})",
        method,
        v.point.coord,
        v.num_samples,
        v.point.rank,
        v.point.feature()
    );
    println!("expected corner {:?}", apex);
    Ok(())
}
