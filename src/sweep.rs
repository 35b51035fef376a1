//! enumerate the valid points of the parameter space

use eyre::{bail, ensure, Result};
use itertools::{izip, Itertools};
use tracing::debug;

use crate::{
    configuration::Configuration,
    settings::{Pairing, SweepSettings, VariantSettings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Precision {
    inp_wl: u32,
    inp_signed: bool,
    wgt_wl: u32,
    wgt_signed: bool,
}

/// length of a group of arrays that are iterated together
fn paired_len(group: &str, lens: &[usize], pairing: Pairing) -> Result<usize> {
    let shortest = lens.iter().copied().min().unwrap_or(0);
    if pairing == Pairing::Strict && lens.iter().any(|&len| len != shortest) {
        bail!("paired arrays {} differ in length: {:?}", group, lens);
    }
    if shortest < lens.iter().copied().max().unwrap_or(0) {
        debug!("paired arrays {} truncated to {}", group, shortest);
    }
    Ok(shortest)
}

fn check_positive(name: &str, values: &[u32]) -> Result<()> {
    ensure!(
        values.iter().all(|&v| v > 0),
        "{} must only hold positive values, got {:?}",
        name,
        values
    );
    Ok(())
}

fn check_sign_flags(name: &str, values: &[u8]) -> Result<()> {
    ensure!(
        values.iter().all(|&v| v <= 1),
        "{} must only hold 0 or 1, got {:?}",
        name,
        values
    );
    Ok(())
}

/// true when `channels` can be split evenly into lanes of `parallelism`
fn folds_evenly(channels: u32, parallelism: u32) -> bool {
    channels % parallelism == 0 && parallelism <= channels
}

/// the filtered cross product, outermost to innermost:
/// feature maps, kernel, precisions, folding
pub fn enumerate(sweep: &SweepSettings, variant: &VariantSettings) -> Result<Vec<Configuration>> {
    check_positive("kdim", &sweep.kdim)?;
    check_positive("ifm_ch", &sweep.ifm_ch)?;
    check_positive("ifm_dim", &sweep.ifm_dim)?;
    check_positive("ofm_ch", &sweep.ofm_ch)?;
    check_positive("inp_wl", &sweep.inp_wl)?;
    check_positive("wgt_wl", &sweep.wgt_wl)?;
    check_positive("simd", &sweep.simd)?;
    check_positive("pe", &sweep.pe)?;

    let pairing = variant.pairing;
    let fm_len = paired_len(
        "(ifm_ch, ifm_dim, ofm_ch)",
        &[sweep.ifm_ch.len(), sweep.ifm_dim.len(), sweep.ofm_ch.len()],
        pairing,
    )?;
    let feature_maps = izip!(&sweep.ifm_ch, &sweep.ifm_dim, &sweep.ofm_ch)
        .take(fm_len)
        .collect_vec();

    let precisions = if variant.signs {
        check_sign_flags("inp_sgn", &sweep.inp_sgn)?;
        check_sign_flags("wgt_sgn", &sweep.wgt_sgn)?;
        let len = paired_len(
            "(inp_wl, inp_sgn, wgt_wl, wgt_sgn)",
            &[
                sweep.inp_wl.len(),
                sweep.inp_sgn.len(),
                sweep.wgt_wl.len(),
                sweep.wgt_sgn.len(),
            ],
            pairing,
        )?;
        izip!(&sweep.inp_wl, &sweep.inp_sgn, &sweep.wgt_wl, &sweep.wgt_sgn)
            .take(len)
            .map(|(&inp_wl, &inp_sgn, &wgt_wl, &wgt_sgn)| Precision {
                inp_wl,
                inp_signed: inp_sgn == 1,
                wgt_wl,
                wgt_signed: wgt_sgn == 1,
            })
            .collect_vec()
    } else {
        let len = paired_len(
            "(inp_wl, wgt_wl)",
            &[sweep.inp_wl.len(), sweep.wgt_wl.len()],
            pairing,
        )?;
        izip!(&sweep.inp_wl, &sweep.wgt_wl)
            .take(len)
            .map(|(&inp_wl, &wgt_wl)| Precision {
                inp_wl,
                inp_signed: false,
                wgt_wl,
                wgt_signed: false,
            })
            .collect_vec()
    };

    let fold_len = paired_len(
        "(simd, pe)",
        &[sweep.simd.len(), sweep.pe.len()],
        pairing,
    )?;
    let foldings = sweep.simd.iter().zip(&sweep.pe).take(fold_len).collect_vec();

    let mut points = vec![];
    for &(&ifm_ch, &ifm_dim, &ofm_ch) in &feature_maps {
        for &kdim in &sweep.kdim {
            if kdim > ifm_dim {
                debug!(kdim, ifm_dim, "kernel larger than the feature map, skipped");
                continue;
            }
            for precision in &precisions {
                let out_wl =
                    variant
                        .out_width
                        .resolve(kdim, ifm_ch, precision.inp_wl, precision.wgt_wl);
                for &(&simd, &pe) in &foldings {
                    if !folds_evenly(ifm_ch, simd) {
                        debug!(ifm_ch, simd, "ifm channels do not fold onto simd, skipped");
                        continue;
                    }
                    if !folds_evenly(ofm_ch, pe) {
                        debug!(ofm_ch, pe, "ofm channels do not fold onto pe, skipped");
                        continue;
                    }
                    points.push(Configuration {
                        index: points.len(),
                        ifm_ch,
                        ifm_dim,
                        ofm_ch,
                        kdim,
                        inp_wl: precision.inp_wl,
                        inp_signed: precision.inp_signed,
                        wgt_wl: precision.wgt_wl,
                        wgt_signed: precision.wgt_signed,
                        out_wl,
                        simd,
                        pe,
                    });
                }
            }
        }
    }
    Ok(points)
}
