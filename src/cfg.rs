use super::*;

// Configs are read and written as RON through `serde`.

pub fn read_from_file<P, T>(path: P) -> Result<T>
where
    P: AsRef<Path>,
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    from_reader(BufReader::new(file))
}

pub fn from_reader<R, T>(reader: R) -> Result<T>
where
    R: std::io::Read,
    T: DeserializeOwned,
{
    Ok(ron::de::from_reader(reader)?)
}

pub fn from_str<T>(text: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    Ok(ron::from_str(text)?)
}

pub fn write_to_file<P, T>(path: P, value: &T) -> Result<()>
where
    P: AsRef<Path>,
    T: Serialize,
{
    let path = path.as_ref();
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    to_writer(BufWriter::new(file), value)
}

pub fn to_writer<W, T>(writer: W, value: &T) -> Result<()>
where
    W: std::io::Write,
    T: Serialize,
{
    let ron_config = ron::ser::PrettyConfig::default();
    ron::ser::to_writer_pretty(writer, &value, ron_config)?;
    Ok(())
}

pub fn to_string<T>(value: &T) -> Result<String>
where
    T: Serialize,
{
    let ron_config = ron::ser::PrettyConfig::default();
    Ok(ron::ser::to_string_pretty(value, ron_config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        name: String,
        values: Vec<f32>,
    }

    #[test]
    fn test_file_roundtrip() {
        let path = std::env::temp_dir().join(format!("raycast-cfg-{}.ron", std::process::id()));
        let sample = Sample {
            name: "sample".to_owned(),
            values: vec![0.5, -1.0, 3.25],
        };
        write_to_file(&path, &sample).unwrap();
        let loaded: Sample = read_from_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, sample);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_from_file::<_, Sample>("/nonexistent/raycast.ron").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/raycast.ron"));
    }

    #[test]
    fn test_parse_error() {
        assert!(from_str::<Sample>("Sample(name: 1)").is_err());
    }
}
