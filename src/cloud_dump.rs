use crate::pipeline::RenderedCloud;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct CloudDump {
    pub width: f64,
    pub height: f64,
    pub font_family: String,
    pub total_words: usize,
    pub placed_words: usize,
    pub words: Vec<WordDump>,
}

#[derive(Debug, Serialize)]
pub struct WordDump {
    pub id: String,
    pub text: String,
    pub size: f64,
    pub font_size: f64,
    pub color: String,
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
}

impl CloudDump {
    pub fn from_cloud(cloud: &RenderedCloud) -> Self {
        let words = cloud
            .placements
            .iter()
            .map(|word| WordDump {
                id: word.id.clone(),
                text: word.text.clone(),
                size: word.size,
                font_size: word.font_size,
                color: word.color.clone(),
                x: word.x,
                y: word.y,
                rotation: word.rotation,
            })
            .collect();

        CloudDump {
            width: cloud.canvas.width,
            height: cloud.canvas.height,
            font_family: cloud.font_family.clone(),
            total_words: cloud.total_words,
            placed_words: cloud.placements.len(),
            words,
        }
    }
}

pub fn write_cloud_dump(path: &Path, cloud: &RenderedCloud) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = CloudDump::from_cloud(cloud);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
