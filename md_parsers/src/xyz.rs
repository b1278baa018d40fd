use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use shared::{
    ensure,
    Context,
    Result,
    CoordinateSequence,
};


#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum XyzLayout {
    /// `{symbol:<2} {x:12.6} {y:12.6} {z:12.6}`
    Aligned,
    /// `{symbol} {x:.6} {y:.6} {z:.6}`
    Compact,
}


/// Write `seq` as multi-frame XYZ. Each frame has the atom count line, the comment line
/// `"{comment} Frame {t}"` and one line per atom.
pub fn write_xyz<W, S>(mut w: W, seq: &CoordinateSequence, atom_types: &[S],
                       comment: &str, layout: XyzLayout) -> Result<()>
where W: Write,
      S: AsRef<str>,
{
    let natoms = seq.natoms();
    ensure!(atom_types.len() == natoms,
        "Number of atoms ({}) does not match the number of atom types ({}).", natoms, atom_types.len());

    for t in 0 .. seq.nframes() {
        writeln!(w, "{}", natoms)?;
        if comment.is_empty() {
            writeln!(w, "Frame {}", t)?;
        } else {
            writeln!(w, "{} Frame {}", comment, t)?;
        }

        let frame = seq.frame(t);
        for (sym, pos) in atom_types.iter().zip(frame.rows()) {
            let sym = sym.as_ref();
            match layout {
                XyzLayout::Aligned => writeln!(w, "{:2} {:12.6} {:12.6} {:12.6}", sym, pos[0], pos[1], pos[2])?,
                XyzLayout::Compact => writeln!(w, "{} {:.6} {:.6} {:.6}", sym, pos[0], pos[1], pos[2])?,
            }
        }
    }

    Ok(())
}


/// Same as [`write_xyz`], writing to file `fname`. Nothing is created if the atom types do not
/// match the trajectory.
pub fn save_xyz<P, S>(fname: P, seq: &CoordinateSequence, atom_types: &[S],
                      comment: &str, layout: XyzLayout) -> Result<()>
where P: AsRef<Path>,
      S: AsRef<str>,
{
    let fname = fname.as_ref();
    ensure!(atom_types.len() == seq.natoms(),
        "Number of atoms ({}) does not match the number of atom types ({}), {:?} not written.",
        seq.natoms(), atom_types.len(), fname);

    let f = File::create(fname).with_context(|| format!("Failed to create {:?}.", fname))?;
    let mut w = BufWriter::new(f);
    write_xyz(&mut w, seq, atom_types, comment, layout)?;
    w.flush()?;
    Ok(())
}
