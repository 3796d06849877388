/* Copyright (C) 2022 Antmicro
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     https://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;

use rrecon::design::{self, Design, RouteStatus};
use rrecon::device::{self, Device, OpenOpts};
use rrecon::exporter::{CompoundJsonExporter, Exporter, XdcExporter};
use rrecon::import::RoutingImporter;
use rrecon::router::route_string::net_route_string;
use rrecon::router::serialize::NetRoutingWithNames;

#[derive(Parser, Debug)]
#[command(
    author = "Antmicro",
    version = "0.1.0",
    about = "RRECON - Route reconstruction from routing checkpoints",
    long_about = None
)]
struct Args {
    #[arg(help = "Device description (JSON or YAML, optionally gzipped)")]
    device: PathBuf,
    #[arg(help = "Placed design description (JSON or YAML, optionally gzipped)")]
    design: PathBuf,
    #[arg(long, help = "Memory-map the (uncompressed) device file")]
    raw: bool,
    #[command(subcommand)]
    command: SubCommands,
}

#[derive(Parser, Debug)]
struct ImportCmd {
    #[arg(help = "Routing record file")]
    routing: PathBuf,
    #[arg(long, help = "Write ROUTE constraints to this file")]
    xdc: Option<PathBuf>,
    #[arg(long, help = "Write merged partition pin routes to this file")]
    part_pin_xdc: Option<PathBuf>,
    #[arg(long, help = "Also export site PIPs of used slices")]
    intrasite: bool,
    #[arg(long, help = "Nets to have their routing exported to JSON (:all for every net)")]
    json: Option<Vec<String>>,
    #[arg(long, default_value = "routing.json", help = "JSON output file")]
    json_out: PathBuf,
}

#[derive(Parser, Debug)]
struct RouteStringCmd {
    #[arg(help = "Routing record file")]
    routing: PathBuf,
    #[arg(help = "Net name")]
    net: String,
}

#[derive(Subcommand, Debug)]
enum SubCommands {
    Import(ImportCmd),
    RouteString(RouteStringCmd),
}

fn load(args: &Args) -> Result<(Device, Design), Box<dyn Error>> {
    let device = device::open(&args.device, OpenOpts { raw: args.raw })?;
    let design = design::open(&args.design, &device)?;
    Ok((device, design))
}

fn import(args: ImportCmd, device: &Device, mut design: Design) -> Result<(), Box<dyn Error>> {
    RoutingImporter::new(device, &mut design).import_file(&args.routing)?;

    let mut counts = [0usize; 3];
    for (_, net) in design.nets() {
        let idx = match net.route_status() {
            RouteStatus::FullyRouted => 0,
            RouteStatus::PartiallyRouted => 1,
            RouteStatus::Unrouted => 2,
        };
        counts[idx] += 1;
    }
    println!(concat!(
        "Design {}:\n",
        "    Fully routed nets:      {}\n",
        "    Partially routed nets:  {}\n",
        "    Unrouted nets:          {}"
        ),
        design.name,
        counts[0],
        counts[1],
        counts[2]
    );

    if let Some(xdc) = args.xdc {
        XdcExporter::new(device, &design).export(xdc, args.part_pin_xdc, args.intrasite)?;
    }

    if args.json.is_some() {
        let mut json_exporter = CompoundJsonExporter::new(&args.json, args.json_out);
        for (id, net) in design.nets() {
            json_exporter.ignore_or_export(&net.name, || {
                NetRoutingWithNames::new(device, &design, id)
            })?;
        }
        json_exporter.flush()?;
    }

    Ok(())
}

fn route_string(args: RouteStringCmd, device: &Device, mut design: Design)
    -> Result<(), Box<dyn Error>>
{
    RoutingImporter::new(device, &mut design).import_file(&args.routing)?;

    let net = design.net_by_name(&args.net)
        .ok_or_else(|| format!("Net \"{}\" does not exist in the design", args.net))?;
    match net_route_string(device, design.net(net)) {
        Some(route) => println!("{}", route),
        None => println!("Net {} has no intersite route", args.net),
    }
    Ok(())
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let (device, design) = load(&args)?;

    match args.command {
        SubCommands::Import(sargs) => import(sargs, &device, design),
        SubCommands::RouteString(sargs) => route_string(sargs, &device, design),
    }
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
