use log::{error, info, LevelFilter};
use printer_plate::{config::Opt, service::HttpSlicingService, store::MeshFile, Error, Workspace};
use simplelog::{Config, TermLogger, TerminalMode};
use std::{fs, path::Path};
use structopt::StructOpt;

const PREVIEW_WIDTH: u32 = 800;
const PREVIEW_HEIGHT: u32 = 800;

fn read_mesh(path: &Path) -> Result<MeshFile, Error> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    Ok(MeshFile::new(name, fs::read(path)?))
}

fn run(opt: &Opt) -> Result<(), Error> {
    let layer_range = opt.layer_range()?;
    let mut workspace = Workspace::default();

    let files = opt.input.iter().map(|p| read_mesh(p)).collect::<Result<Vec<_>, _>>()?;
    let report = workspace.add_files(files)?;
    for (name, e) in &report.rejected {
        error!("skipping {}: {}", name, e);
    }
    for instance in workspace.scene().instances() {
        if let Some(bounds) = instance.bounds {
            info!(
                "{} at ({:.1}, {:.1}) size {:.1} x {:.1} x {:.1}",
                instance.name(),
                instance.transform.position.x,
                instance.transform.position.y,
                bounds.size().x,
                bounds.size().y,
                bounds.size().z
            );
        }
    }

    if let (Some(path), Some(combined)) = (&opt.combined, workspace.combined()) {
        fs::write(path, &combined.bytes)?;
        info!("wrote merged plate to {}", path.display());
    }

    if opt.output.is_none() && opt.svg.is_none() {
        return Ok(());
    }

    let service = HttpSlicingService::new(opt.server());
    workspace.update_parameters(opt.parameters().into())?;
    let gcode = workspace.slice(&service)?;

    if let Some(path) = &opt.output {
        fs::write(path, &gcode.bytes)?;
        info!("wrote {} to {}", gcode.name, path.display());
    }

    if let Some(mut viewer) = workspace.viewer(PREVIEW_WIDTH, PREVIEW_HEIGHT) {
        info!("{} layers", viewer.toolpath().layer_count());
        if let Some(price) = viewer.toolpath().estimated_price() {
            info!("estimated price {:.2}", price);
        }
        if let Some(path) = &opt.svg {
            if let Some((first, last)) = layer_range {
                viewer.set_layer_range(first, last);
                viewer.fit();
            }
            fs::write(path, viewer.render_svg())?;
            info!("wrote preview to {}", path.display());
        }
    }
    Ok(())
}

fn main() {
    let opt = Opt::from_args();

    let level = if opt.debug { LevelFilter::Debug } else { LevelFilter::Info };
    if TermLogger::init(level, Config::default(), TerminalMode::Mixed).is_err() {
        eprintln!("couldn't start logger");
    }

    if let Err(e) = run(&opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
