#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqiLevel {
    pub min: i32,
    pub max: i32,
    pub label: &'static str,
    pub description: &'static str,
    pub health_advice: &'static str,
    pub color: &'static str,
}

/// EPA-style AQI bands. Values past the last band's upper bound fall through
/// to Hazardous.
pub const AQI_LEVELS: [AqiLevel; 6] = [
    AqiLevel {
        min: 0,
        max: 50,
        label: "Good",
        description: "Air quality is considered satisfactory",
        health_advice: "Air quality is satisfactory and air pollution poses little or no risk.",
        color: "#10B981",
    },
    AqiLevel {
        min: 51,
        max: 100,
        label: "Moderate",
        description: "Air quality is acceptable",
        health_advice: "Air quality is acceptable for most people. However, sensitive groups may experience minor respiratory symptoms.",
        color: "#F59E0B",
    },
    AqiLevel {
        min: 101,
        max: 150,
        label: "Unhealthy for Sensitive Groups",
        description: "Sensitive groups may experience health effects",
        health_advice: "Active children and adults, and people with respiratory disease should limit prolonged outdoor exertion.",
        color: "#F97316",
    },
    AqiLevel {
        min: 151,
        max: 200,
        label: "Unhealthy",
        description: "Everyone may begin to experience health effects",
        health_advice: "Active children and adults, and people with respiratory disease should avoid prolonged outdoor exertion.",
        color: "#EF4444",
    },
    AqiLevel {
        min: 201,
        max: 300,
        label: "Very Unhealthy",
        description: "Health alert: everyone may experience serious effects",
        health_advice: "Active children and adults, and people with respiratory disease should avoid all outdoor exertion.",
        color: "#8B5CF6",
    },
    AqiLevel {
        min: 301,
        max: 999,
        label: "Hazardous",
        description: "Health warnings of emergency conditions",
        health_advice: "Everyone should avoid all outdoor exertion. People with respiratory or heart disease should remain indoors.",
        color: "#374151",
    },
];

pub fn level_for(aqi: i32) -> &'static AqiLevel {
    AQI_LEVELS
        .iter()
        .find(|level| aqi >= level.min && aqi <= level.max)
        .unwrap_or(&AQI_LEVELS[AQI_LEVELS.len() - 1])
}

pub fn color_for(aqi: i32) -> &'static str {
    if aqi <= 50 {
        "#10B981"
    } else if aqi <= 100 {
        "#F59E0B"
    } else if aqi <= 150 {
        "#F97316"
    } else if aqi <= 200 {
        "#EF4444"
    } else if aqi <= 300 {
        "#8B5CF6"
    } else {
        "#374151"
    }
}
