//! text generators for the RTL side: parameter package, top-level wrappers,
//! per-PE weight memories and the simulator project file

use std::{
    fs,
    path::{Path, PathBuf},
};

use eyre::{ensure, Context, Result};
use itertools::Itertools;
use tracing::info;

use crate::settings::HdlSettings;

const PAD: u32 = 0;

/// one `parameter` line shared by the package and the wrappers
struct Param {
    name: &'static str,
    value: String,
    comment: &'static str,
}

fn param(name: &'static str, value: impl ToString, comment: &'static str) -> Param {
    Param {
        name,
        value: value.to_string(),
        comment,
    }
}

/// the geometry and datatype parameters, derived ones as expressions
fn core_params(hdl: &HdlSettings, mmv: u32) -> Vec<Param> {
    vec![
        param("KDim", hdl.kdim, "Kernel dimensions"),
        param("IFMCh", hdl.ifm_ch, "Input feature map channels"),
        param("OFMCh", hdl.ofm_ch, "Output feature map channels or the number of filter banks"),
        param("IFMDim", hdl.ifm_dim, "Input feature map dimensions"),
        param("PAD", PAD, "Padding around the input feature map"),
        param("STRIDE", hdl.stride, "Number of pixels to move across when applying the filter"),
        param("OFMDim", "(IFMDim-KDim+2*PAD)/STRIDE+1", "Output feature map dimensions"),
        param("MatrixW", "KDim*KDim*IFMCh", "Width of the input matrix"),
        param("MatrixH", "OFMCh", "Height of the input matrix"),
        param("SIMD", hdl.simd, "Number of input columns computed in parallel"),
        param("PE", hdl.pe, "Number of output rows computed in parallel"),
        param("WMEM_DEPTH", "(KDim*KDim*IFMCh*OFMCh)/(SIMD*PE)", "Depth of each weight memory"),
        param("MMV", mmv, "Number of output pixels computed in parallel"),
        param("TSrcI", hdl.inp_wl, "DataType of the input activation (as used in the MAC)"),
        param("TSrcI_BIN", hdl.inp_bin, "1-bit TSrcI is interpreted as +1/-1"),
        param("TI", "SIMD*TSrcI", "SIMD times the word length of input stream"),
        param("TW", hdl.wgt_wl, "Word length of individual weights"),
        param("TW_BIN", hdl.wgt_bin, "1-bit TW is interpreted as +1/-1"),
        param("TDstI", hdl.out_wl, "DataType of the output activation"),
        param("TO", "PE*TDstI", "PE times the word length of output stream"),
        param("TA", hdl.out_wl, "PE times the word length of the activation class"),
    ]
}

/// `parameter integer` list of a module header, closed with `)`
fn module_params(params: &[Param]) -> String {
    let last = params.len().saturating_sub(1);
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let sep = if i == last { ")" } else { "," };
            format!(
                "   parameter integer {}={}{} // {}\n",
                p.name, p.value, sep, p.comment
            )
        })
        .collect()
}

/// `.NAME (NAME)` overrides of an instantiation, closed with `)`
fn param_overrides(params: &[Param]) -> String {
    let last = params.len().saturating_sub(1);
    params
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let sep = if i == last { ")" } else { "," };
            format!("   .{:<11}({}){}\n", p.name, p.name, sep)
        })
        .collect()
}

pub fn mvau_defn(hdl: &HdlSettings) -> String {
    let mut params = core_params(hdl, hdl.mmv);
    params.extend([
        param("USE_DSP", 0, "Use DSP blocks or LUTs for MAC"),
        param("INST_WMEM", 1, "Instantiate weight memory; if needed"),
        param("USE_ACT", 0, "Use activation after matrix-vector activation"),
    ]);
    let mut out = String::from(
        "/*\n * Package: mvau_defn.sv\n *\n * Definitions and constants of the matrix-vector activation unit\n */\n\n",
    );
    out.push_str("`ifndef MVAU_DEFN_PKG // if the already-compiled flag is not set\n");
    out.push_str(" `define MVAU_DEFN_PKG //set the flag\n");
    out.push_str("package mvau_defn;\n");
    out.push_str("   parameter VERSION = \"0.1\";\n");
    for p in &params {
        out.push_str(&format!(
            "   parameter int {}={}; // {}\n",
            p.name, p.value, p.comment
        ));
    }
    out.push_str("\nendpackage\n\n");
    out.push_str("   import mvau_defn::*; // import package into $unit compilation space\n");
    out.push_str("`endif\n");
    out
}

pub fn mvau_top(hdl: &HdlSettings) -> String {
    let mut params = core_params(hdl, hdl.mmv);
    params.extend([
        param("OP_SGN", hdl.op_sgn, "Signedness of input activation/weights"),
        param("DSP_TRUE", 0, "Use DSP blocks or LUTs for MAC"),
        param("INST_WMEM", 1, "Instantiate weight memory, if needed"),
        param("MVAU_STREAM", 0, "Top module is not MVAU Stream"),
        param("USE_ACT", 0, "Use activation after matrix-vector activation"),
    ]);
    format!(
        r#"/*
 * Module: MVAU Top Level Verilog Wrapper (mvau_top)
 */

`timescale 1ns/1ns

module mvau_top #(
{header}(
   input            aresetn, // active low synchronous reset
   input            aclk, // main clock

   // Axis Stream interface
   input            m0_axis_tready,
   output           s0_axis_tready,

   input  [TI-1:0]  s0_axis_tdata, // input stream
   input            s0_axis_tvalid, // input valid
   output           m0_axis_tvalid, // Output valid
   output [TO-1:0]  m0_axis_tdata); //output stream

   mvau #(
{overrides}   mvau_inst(
      .aresetn(aresetn),
      .aclk(aclk),
      .rready(m0_axis_tready),
      .wready(s0_axis_tready),
      .in(s0_axis_tdata),
      .in_v(s0_axis_tvalid),
      .out_v(m0_axis_tvalid),
      .out(m0_axis_tdata)
      );

endmodule // mvau_top
"#,
        header = module_params(&params),
        overrides = param_overrides(&params),
    )
}

/// the stream-only wrapper always computes one pixel at a time
pub fn mvau_stream_top(hdl: &HdlSettings) -> String {
    let mut params = core_params(hdl, 1);
    params.extend([
        param("USE_DSP", 0, "Use DSP blocks or LUTs for MAC"),
        param("MVAU_STREAM", 1, "Top module is MVAU Stream or not"),
        param("USE_ACT", 0, "Use activation after matrix-vector activation"),
    ]);
    format!(
        r#"/*
 * Module: MVAU Stream Top Level Verilog Wrapper (mvau_stream_top)
 */

`timescale 1ns/1ns

module mvau_stream_top #(
{header}(
   input                   aresetn, // active low synchronous reset
   input                   aclk, // main clock

   // Axis Stream interface
   input                   m0_axis_tready,
   input  [TI-1:0]         s0_axis_tdata,  // input stream
   input                   s0_axis_tvalid, // input valid
   input  [0:PE*SIMD*TW-1] s1_axis_tdata,  // Streaming weight tile
   input                   s1_axis_tvalid, // Streaming weight tile valid
   output                  s0_axis_tready, // Ready for input stream
   output                  s1_axis_tready, // Stream weight output ready
   output                  m0_axis_tvalid, // Output valid
   output [TO-1:0]         m0_axis_tdata); //output stream

   mvau_stream #(
{overrides}   mvau_stream_inst(
      .aresetn     (aresetn),
      .aclk        (aclk),
      .rready      (m0_axis_tready),
      .wready      (s0_axis_tready),
      .in_act      (s0_axis_tdata),
      .in_v        (s0_axis_tvalid),
      .wmem_wready (s1_axis_tready),
      .in_wgt      (s1_axis_tdata),
      .in_wgt_v    (s1_axis_tvalid),
      .out_v       (m0_axis_tvalid),
      .out         (m0_axis_tdata)
      );

endmodule // mvau_stream_top
"#,
        header = module_params(&params),
        overrides = param_overrides(&params),
    )
}

/// block RAM of one PE, initialised from `weight_mem<id>.mem`
pub fn weight_mem(id: u32) -> String {
    format!(
        r#"/*
 * Module: MVAU Weight Memory (mvau_weight_mem{id}.sv)
 *
 * Depth (KDim^2 * IFMCh * OFMCh)/(SIMD * PE), words of SIMD*TW bits
 */

`timescale 1ns/1ns
`include "mvau_defn.sv"

module mvau_weight_mem{id} #(parameter int WMEM_ID=0,
                       parameter int WMEM_ADDR_BW=4)
   (
    input                          clk,
    input logic [WMEM_ADDR_BW-1:0] wmem_addr,
    output logic [(SIMD*TW)-1:0]   wmem_out);

   // Signal: weight_mem
   (* ram_style = "block" *) logic [SIMD*TW-1:0] weight_mem [0:WMEM_DEPTH-1];
   initial
     $readmemh("weight_mem{id}.mem", weight_mem);

   // Always_FF: WMEM_READ_OUT
   always_ff @(posedge clk) begin: WMEM_READ_OUT
      wmem_out = weight_mem[wmem_addr];
   end

endmodule // mvau_weight_mem{id}
"#,
        id = id
    )
}

pub fn weight_mem_merged(pe: u32) -> String {
    let instances = (0..pe)
        .map(|p| {
            format!(
                r#"   mvau_weight_mem{p} #(.WMEM_ADDR_BW(WMEM_ADDR_BW))
   mvau_weigt_mem{p}_inst(
      .clk,
      .wmem_addr,
      .wmem_out(wmem_out[{p}])
      );
"#,
                p = p
            )
        })
        .join("");
    format!(
        r#"/*
 * Module: MVAU Weights Top Level file (mvau_weight_mem_merged.sv)
 */

`timescale 1ns/1ns
// Package file for parameters
`include "mvau_defn.sv"

module mvau_weight_mem_merged #(parameter int WMEM_ID=0,
                                parameter int WMEM_ADDR_BW=4)
   (
    input logic                    clk, // main clock
    input logic [WMEM_ADDR_BW-1:0] wmem_addr,
    output logic [(SIMD*TW)-1:0]   wmem_out [0:PE-1]);

{instances}endmodule // mvau_weight_mem_merged
"#,
        instances = instances
    )
}

/// the simulator project: test benches, the unit sources and one weight
/// memory per PE
pub fn project_files(pe: u32) -> String {
    let mut lines = vec![
        "sv work mvau_tb_v1.sv".to_string(),
        "sv work mvau_tb_v2.sv".to_string(),
        "sv work mvau_tb_v3.sv".to_string(),
        "verilog work ../src/mvau_top/mvau_top.v".to_string(),
        "sv work ../src/mvau_top/mvau.sv".to_string(),
        "sv work ../src/mvau_top/mvau_control_block.sv".to_string(),
    ];
    lines.extend((0..pe).map(|p| format!("sv work ../src/mvau_top/mvau_weight_mem{}.sv", p)));
    lines.extend(
        [
            "mvau_weight_mem_merged.sv",
            "mvau_stream/mvau_stream.sv",
            "mvau_stream/mvau_inp_buffer.sv",
            "mvau_stream/mvau_stream_control_block.sv",
            "mvau_stream/mvu_pe/mvu_pe.sv",
            "mvau_stream/mvu_pe/mvu_pe_simd_std.sv",
            "mvau_stream/mvu_pe/mvu_pe_simd_binary.sv",
            "mvau_stream/mvu_pe/mvu_pe_simd_xnor.sv",
            "mvau_stream/mvu_pe/mvu_pe_adders.sv",
            "mvau_stream/mvu_pe/mvu_pe_popcount.sv",
            "mvau_stream/mvu_pe/mvu_pe_acc.sv",
        ]
        .iter()
        .map(|f| format!("sv work ../src/mvau_top/{}", f)),
    );
    lines.iter().map(|l| format!("{}\n", l)).collect()
}

/// write every generated file into `dir`, returning the written paths
pub fn generate_all(hdl: &HdlSettings, dir: &Path) -> Result<Vec<PathBuf>> {
    ensure!(hdl.pe >= 1, "PE must be at least 1, got {}", hdl.pe);
    ensure!(hdl.simd >= 1, "SIMD must be at least 1, got {}", hdl.simd);
    fs::create_dir_all(dir).wrap_err_with(|| format!("cannot create {:?}", dir))?;

    let mut files = vec![
        ("mvau_defn.sv".to_string(), mvau_defn(hdl)),
        ("mvau_top.v".to_string(), mvau_top(hdl)),
        ("mvau_stream_top.v".to_string(), mvau_stream_top(hdl)),
    ];
    files.extend((0..hdl.pe).map(|p| (format!("mvau_weight_mem{}.sv", p), weight_mem(p))));
    files.push((
        "mvau_weight_mem_merged.sv".to_string(),
        weight_mem_merged(hdl.pe),
    ));
    files.push(("mvau_files.prj".to_string(), project_files(hdl.pe)));

    let mut written = vec![];
    for (name, content) in files {
        let path = dir.join(name);
        fs::write(&path, content).wrap_err_with(|| format!("cannot write {:?}", path))?;
        info!("generated {:?}", path);
        written.push(path);
    }
    Ok(written)
}
