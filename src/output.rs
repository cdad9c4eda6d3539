// src/output.rs
use crate::mc::ensemble::{EnsembleSummary, Trajectory};
use std::fs::File;
use std::io::{self, BufWriter, Write};

/// One row per recorded time, one column per state element
pub fn write_trajectory_to_csv(filename: &str, variable: &str, trajectory: &Trajectory) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    let width = trajectory.states.first().map_or(0, |s| s.len());
    write!(file, "t")?;
    for i in 0..width {
        write!(file, ",{}_{}", variable, i)?;
    }
    writeln!(file)?;

    for (t, state) in trajectory.times.iter().zip(&trajectory.states) {
        write!(file, "{}", t)?;
        for value in state.iter() {
            write!(file, ",{}", value)?;
        }
        writeln!(file)?;
    }
    file.flush()
}

pub fn write_summary_to_csv(filename: &str, rows: &[(&str, EnsembleSummary)]) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(filename)?);
    writeln!(file, "label,paths,mean,variance,std_error,min,max")?;
    for (label, s) in rows {
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            label, s.paths, s.mean, s.variance, s.std_error, s.min, s.max
        )?;
    }
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_trajectory_csv() {
        let trajectory = Trajectory {
            times: vec![0.0, 0.5],
            states: vec![array![1.0, 2.0], array![0.5, 1.5]],
        };
        let path = std::env::temp_dir().join("neurint_trajectory_test.csv");
        let path = path.to_str().unwrap();
        write_trajectory_to_csv(path, "V", &trajectory).unwrap();

        let contents = std::fs::read_to_string(path).unwrap();
        assert_eq!(contents, "t,V_0,V_1\n0,1,2\n0.5,0.5,1.5\n");
        std::fs::remove_file(path).unwrap();
    }
}
