//! Export helpers for CSV and JSON trajectory artifacts.

pub mod trajectory {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    const HEADER: &str = "time_s,nu_rad,r_x_km,r_y_km,r_z_km,v_x_km_s,v_y_km_s,v_z_km_s";

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Write the standard trajectory CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// One propagated sample along the arc.
    #[derive(Debug, Clone, Serialize)]
    pub struct Sample {
        pub time_s: f64,
        pub nu_rad: f64,
        pub position_km: [f64; 3],
        pub velocity_km_s: [f64; 3],
    }

    impl Sample {
        /// Serialize the sample to CSV, matching the standard header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{},{:.9},{:.6},{:.6},{:.6},{:.9},{:.9},{:.9}",
                self.time_s,
                self.nu_rad,
                self.position_km[0],
                self.position_km[1],
                self.position_km[2],
                self.velocity_km_s[0],
                self.velocity_km_s[1],
                self.velocity_km_s[2],
            )
        }
    }

    /// Envelope of a propagated trajectory written as a JSON sidecar.
    #[derive(Debug, Serialize)]
    pub struct TrajectorySidecar<'a> {
        pub attractor: &'a str,
        pub mu_km3_s2: f64,
        pub solver: &'a str,
        pub tof_s: f64,
        pub samples: &'a [Sample],
    }

    /// Write the full CSV artifact (header plus rows).
    pub fn write_csv(writer: &mut dyn Write, samples: &[Sample]) -> io::Result<()> {
        write_header(writer)?;
        for sample in samples {
            sample.write_to(writer)?;
        }
        Ok(())
    }

    /// Write the JSON sidecar next to the main artifact.
    pub fn write_json_sidecar(path: &Path, sidecar: &TrajectorySidecar<'_>) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, sidecar)?;
        Ok(())
    }
}
