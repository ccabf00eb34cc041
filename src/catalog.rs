use crate::canvas::Color;
use crate::state::Snapshot;

pub const RAM_KEY: &str = "RAM";
pub const VRAM_KEY: &str = "VRAM";

pub const EXPANDED_BY_DEFAULT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub title: &'static str,
    pub keys: &'static [&'static str],
}

impl Category {
    pub const fn new(title: &'static str, keys: &'static [&'static str]) -> Self {
        Self { title, keys }
    }
}

pub const CATEGORIES: &[Category] = &[
    Category::new(
        "== System ==",
        &["Python version", "Operating System", "CPU", "RAM"],
    ),
    Category::new(
        "== GPU / CUDA ==",
        &[
            "VRAM",
            "GPU",
            "CUDA version",
            "Flash Attention",
            "flash-attn (package)",
        ],
    ),
    Category::new(
        "== Core libs ==",
        &["PyTorch", "torchvision", "xformers", "numpy"],
    ),
    Category::new(
        "== Vision / Audio ==",
        &["OpenCV", "Pillow", "ultralytics", "mediapipe"],
    ),
    Category::new(
        "== ONNX / Runtime ==",
        &["onnx", "onnxruntime", "accelerate", "bitsandbytes"],
    ),
    Category::new(
        "== Text ==",
        &[
            "transformers",
            "diffusers",
            "huggingface_hub",
            "tokenizers",
            "sentencepiece",
        ],
    ),
    Category::new(
        "== Others ==",
        &[
            "kornia",
            "insightface",
            "scipy",
            "scikit-image",
            "pandas",
            "triton",
            "sageattention",
        ],
    ),
];

// The text report groups facts slightly differently from the dashboard:
// System lives in the header, VRAM is live-only and timm shows up here.
const REPORT_CATEGORIES: &[Category] = &[
    Category::new(
        "== GPU / CUDA ==",
        &[
            "GPU",
            "CUDA version",
            "Flash Attention",
            "flash-attn (package)",
        ],
    ),
    Category::new(
        "== Core libs ==",
        &["PyTorch", "torchvision", "xformers", "numpy"],
    ),
    Category::new(
        "== Vision / Audio ==",
        &["OpenCV", "Pillow", "timm", "ultralytics", "mediapipe"],
    ),
    Category::new(
        "== ONNX / Runtime ==",
        &["onnx", "onnxruntime", "accelerate", "bitsandbytes"],
    ),
    Category::new(
        "== Text ==",
        &[
            "transformers",
            "diffusers",
            "huggingface_hub",
            "tokenizers",
            "sentencepiece",
        ],
    ),
    Category::new(
        "== Others ==",
        &[
            "kornia",
            "insightface",
            "scipy",
            "scikit-image",
            "pandas",
            "triton",
            "sageattention",
        ],
    ),
];

const REPORT_HEADER_KEYS: [&str; 3] = ["Python version", "Operating System", "CPU"];

pub mod palette {
    use crate::canvas::Color;

    pub const HEADER_BG: Color = Color::from_hex(0x1f2430);
    pub const FALLBACK_TEXT: Color = Color::from_hex(0xdddddd);
    pub const OK: Color = Color::from_hex(0x22c55e);
    pub const WARN: Color = Color::from_hex(0xf59e0b);
    pub const BAD: Color = Color::from_hex(0xef4444);
    pub const STRIPE: Color = Color::from_hex(0x4a90e2);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Text,
    RamMeter,
    VramMeter,
}

pub fn metric_kind(key: &str) -> MetricKind {
    match key {
        RAM_KEY => MetricKind::RamMeter,
        VRAM_KEY => MetricKind::VramMeter,
        _ => MetricKind::Text,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Normal,
    Warn,
    Bad,
}

impl Status {
    pub fn of(value: &str) -> Self {
        let lower = value.to_lowercase();
        if value.is_empty() || lower.contains("not installed") {
            Status::Bad
        } else if lower.contains("unknown") || lower.contains("present") {
            Status::Warn
        } else {
            Status::Normal
        }
    }

    pub fn color(self) -> Color {
        match self {
            Status::Normal => palette::STRIPE,
            Status::Warn => palette::WARN,
            Status::Bad => palette::BAD,
        }
    }
}

pub const DEFAULT_ICON: &str = "ℹ️";

pub fn icon_for(key: &str) -> &'static str {
    match key {
        "Python version" => "🐍",
        "Operating System" => "🖥️",
        "CPU" => "⚙️",
        "RAM" | "VRAM" | "mediapipe" => "🧠",
        "GPU" => "🎮",
        "CUDA version" => "🚀",
        "PyTorch" => "🔥",
        "torchvision" => "👁️",
        "xformers" | "flash-attn (package)" => "⚡",
        "numpy" => "🔢",
        "Pillow" | "timm" => "🖼️",
        "OpenCV" => "📷",
        "transformers" => "🧩",
        "diffusers" => "💧",
        "huggingface_hub" => "🤗",
        "tokenizers" => "🔤",
        "onnx" => "🧱",
        "onnxruntime" => "🏃",
        "accelerate" => "🏎️",
        "bitsandbytes" => "🧮",
        "ultralytics" => "🕵️",
        "sentencepiece" => "✂️",
        "kornia" => "🧪",
        "insightface" => "🙂",
        "scipy" => "📐",
        "scikit-image" => "🧷",
        "pandas" => "🐼",
        "triton" => "🔱",
        "sageattention" => "🌿",
        _ => DEFAULT_ICON,
    }
}

pub fn find_category<'a>(catalog: &'a [Category], title: &str) -> Option<&'a Category> {
    catalog.iter().find(|c| c.title == title)
}

pub fn format_report(snapshot: &Snapshot) -> String {
    let header = REPORT_HEADER_KEYS
        .iter()
        .map(|key| format!("{key}: {}", snapshot.get(key).unwrap_or("Unknown")))
        .collect::<Vec<_>>()
        .join("\n");

    let mut body = format!("RAM: {}\n", snapshot.get(RAM_KEY).unwrap_or("Unknown"));
    for category in REPORT_CATEGORIES {
        body.push('\n');
        body.push_str(category.title);
        body.push('\n');
        for key in category.keys {
            if let Some(value) = snapshot.get(key) {
                body.push_str(&format!("{key}: {value}\n"));
            }
        }
    }

    format!("{header}\n\n{}\n", body.trim())
}
