//! Localized display strings.
//!
//! Each supported language is a flat key -> string table. English is the
//! complete table; the others may be partial. Lookups fall back to English
//! and then to the key itself, so `translate` never fails.

use std::fmt::Display;

/// A supported display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub code: &'static str,
    /// Native name shown in the selector
    pub name: &'static str,
    pub flag: &'static str,
}

/// Code of the fallback table.
pub const DEFAULT_LANGUAGE: &str = "en";

pub const LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English", flag: "🇺🇸" },
    Language { code: "es", name: "Español", flag: "🇪🇸" },
    Language { code: "fr", name: "Français", flag: "🇫🇷" },
    Language { code: "ht", name: "Kreyòl", flag: "🇭🇹" },
    Language { code: "ar", name: "العربية", flag: "🇸🇦" },
    Language { code: "zh", name: "中文", flag: "🇨🇳" },
];

/// Named substitution values for `{{name}}` placeholders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    values: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter; a later value for the same name wins.
    pub fn with(mut self, name: impl Into<String>, value: impl Display) -> Self {
        let name = name.into();
        self.values.retain(|(n, _)| *n != name);
        self.values.push((name, value.to_string()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Active-language lookup over the static tables.
#[derive(Debug, Clone)]
pub struct Localizer {
    current: String,
}

impl Default for Localizer {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGE)
    }
}

impl Localizer {
    pub fn new(code: &str) -> Self {
        let mut localizer = Self {
            current: DEFAULT_LANGUAGE.to_string(),
        };
        localizer.set_language(code);
        localizer
    }

    /// Active language code
    pub fn language(&self) -> &str {
        &self.current
    }

    /// The active language's descriptor, if it is a supported one.
    pub fn current_language(&self) -> Option<&'static Language> {
        LANGUAGES.iter().find(|l| l.code == self.current)
    }

    pub fn languages(&self) -> &'static [Language] {
        LANGUAGES
    }

    /// Switch language. Unknown or partial tables are tolerated; missing keys
    /// resolve through the English fallback.
    pub fn set_language(&mut self, code: &str) {
        if table(code).is_none() {
            tracing::debug!(code, "No translation table for language, using fallback");
        }
        self.current = code.to_string();
    }

    /// Select the language after the active one (wrapping).
    pub fn cycle_language(&mut self) {
        let next = LANGUAGES
            .iter()
            .position(|l| l.code == self.current)
            .map(|i| (i + 1) % LANGUAGES.len())
            .unwrap_or(0);
        self.current = LANGUAGES[next].code.to_string();
    }

    pub fn translate(&self, key: &str) -> String {
        self.resolve(key).to_string()
    }

    pub fn translate_with(&self, key: &str, params: &Params) -> String {
        substitute(self.resolve(key), params)
    }

    fn resolve<'a>(&self, key: &'a str) -> &'a str {
        lookup(&self.current, key)
            .or_else(|| lookup(DEFAULT_LANGUAGE, key))
            .unwrap_or(key)
    }
}

fn lookup(code: &str, key: &str) -> Option<&'static str> {
    table(code)?
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
}

/// Replace every `{{name}}` whose name is in `params`. Anything else,
/// including an unterminated `{{`, is copied through unchanged.
pub fn substitute(template: &str, params: &Params) -> String {
    if params.is_empty() {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        match after_open.find("}}") {
            Some(close) => {
                let name = &after_open[..close];
                match params.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("{{");
                        out.push_str(name);
                        out.push_str("}}");
                    }
                }
                rest = &after_open[close + 2..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

type Table = &'static [(&'static str, &'static str)];

fn table(code: &str) -> Option<Table> {
    match code {
        "en" => Some(EN),
        "es" => Some(ES),
        "fr" => Some(FR),
        "ht" => Some(HT),
        "ar" => Some(AR),
        "zh" => Some(ZH),
        _ => None,
    }
}

const EN: Table = &[
    ("uploadImages", "Upload Satellite Images"),
    ("dragDropImages", "Drag & drop images here"),
    ("supportedFormats", "Supports JPEG, PNG, TIFF formats"),
    ("selectFiles", "Select Files"),
    ("useSampleData", "Use Sample Data"),
    ("availableSamples", "Available Sample Data"),
    ("uploadImagesFirst", "Upload images to begin GAN enhancement"),
    ("uploadEnhancedFirst", "Upload enhanced images to begin SKAI analysis"),
    ("ganEnhancement", "GAN Image Enhancement"),
    ("originalImage", "Original Satellite Image"),
    ("enhancedImage", "GAN Enhanced Image"),
    ("damageOverlay", "Damage Overlay"),
    ("startEnhancement", "Start Enhancement"),
    ("processing", "Processing with GAN..."),
    ("enhancementComplete", "Enhancement Complete!"),
    ("damageAreasDetected", "Detected {{count}} damage areas"),
    ("downloadEnhanced", "Download Enhanced"),
    ("skaiAnalysis", "SKAI Damage Analysis"),
    ("startAnalysis", "Run SKAI Analysis"),
    ("analyzing", "Running SKAI damage detection..."),
    ("analysisComplete", "Detected {{count}} damage areas with {{buildings}} affected buildings"),
    ("damageSummary", "AI Damage Summary"),
    ("generateSummaryPrompt", "Generate AI-powered damage assessment"),
    ("generateSummary", "Generate Summary"),
    ("analyzingDamage", "Analyzing damage patterns..."),
    ("overallAssessment", "Overall Assessment"),
    ("severity", "Severity"),
    ("affectedArea", "Affected Area"),
    ("damageLevel", "Damage Level"),
    ("infrastructurePriority", "Infrastructure Priority"),
    ("units", "units"),
    ("damaged", "damaged"),
    ("priority", "Priority"),
    ("populationImpact", "Population Impact"),
    ("affected", "Affected"),
    ("displaced", "Displaced"),
    ("vulnerable", "Vulnerable"),
    ("vulnerabilityMap", "Population Vulnerability Map"),
    ("layers", "Layers"),
    ("riskLevel", "Risk Level"),
    ("high", "High"),
    ("medium", "Medium"),
    ("low", "Low"),
    ("highRiskZones", "High Risk"),
    ("mediumRiskZones", "Medium Risk"),
    ("lowRiskZones", "Low Risk"),
    ("coverage", "Coverage"),
    ("aiAssistant", "GPT Multilingual Assistant"),
    ("welcomeMessage", "Hello! I can help you with disaster response operations. Ask me about evacuation routes, shelter locations, or resource allocation."),
    ("quickQuestions", "Quick Questions"),
    ("quickQuestion1", "Evacuation routes?"),
    ("quickQuestion2", "Nearest shelter?"),
    ("quickQuestion3", "Medical facilities?"),
    ("quickQuestion4", "Supply distribution?"),
    ("typeMessage", "Type your message..."),
    ("botEvacuationResponse", "Based on current damage assessment, I recommend using Highway 9 north and Route 15 east as primary evacuation corridors. Avoid downtown area due to debris."),
    ("botShelterResponse", "The nearest operational shelter is at Central High School (3.2km north). Capacity: 500 people. Contact: +1-555-0123"),
    ("botMedicalResponse", "Memorial Hospital (2.1km) is operational with emergency services. For urgent cases, helicopter landing zone is available at City Park."),
    ("botSupplyResponse", "Supply distribution points: 1) Fire Station #3 (food, water) 2) Community Center (medical supplies) 3) School parking lot (emergency kits)"),
    ("botDefaultResponse", "I can help with evacuation routes, shelter information, medical facilities, supply distribution, and operational coordination. What specific information do you need?"),
    ("downloadReports", "Generate Reports"),
    ("disasterReport", "Haiti Earthquake Assessment"),
    ("completed", "Completed"),
    ("selectFormats", "Select Export Formats"),
    ("itemsSelected", "items selected"),
    ("totalSize", "Total size"),
    ("generating", "Generating..."),
    ("download", "Download Package"),
    ("share", "Share Report"),
    ("downloadHelp", "Reports include damage assessment, population impact analysis, and operational recommendations for field teams."),
    ("downloadStarted", "Download started! Files will be saved to your downloads folder."),
    ("operationFailed", "{{operation}} failed: {{reason}}"),
    ("signIn", "Sign In"),
    ("signOut", "Sign Out"),
    ("invalidCredentials", "Invalid username or password"),
    ("authenticating", "Authenticating..."),
    ("notSignedIn", "Not signed in"),
    ("signedInAs", "Signed in as {{name}} ({{organization}})"),
];

const ES: Table = &[
    ("uploadImages", "Subir Imágenes Satelitales"),
    ("dragDropImages", "Arrastra y suelta imágenes aquí"),
    ("supportedFormats", "Soporta formatos JPEG, PNG, TIFF"),
    ("selectFiles", "Seleccionar Archivos"),
    ("useSampleData", "Usar Datos de Muestra"),
    ("availableSamples", "Datos de Muestra Disponibles"),
    ("uploadImagesFirst", "Sube imágenes para comenzar mejora GAN"),
    ("ganEnhancement", "Mejora de Imagen GAN"),
    ("originalImage", "Imagen Satelital Original"),
    ("enhancedImage", "Imagen Mejorada con GAN"),
    ("damageOverlay", "Superposición de Daños"),
    ("startEnhancement", "Iniciar Mejora"),
    ("processing", "Procesando con GAN..."),
    ("enhancementComplete", "¡Mejora Completada!"),
    ("damageAreasDetected", "Detectadas {{count}} áreas de daño"),
    ("downloadEnhanced", "Descargar Mejorada"),
    ("damageSummary", "Resumen de Daños IA"),
    ("generateSummaryPrompt", "Generar evaluación de daños con IA"),
    ("generateSummary", "Generar Resumen"),
    ("analyzingDamage", "Analizando patrones de daño..."),
    ("overallAssessment", "Evaluación General"),
    ("severity", "Severidad"),
    ("affectedArea", "Área Afectada"),
    ("damageLevel", "Nivel de Daño"),
    ("infrastructurePriority", "Prioridad de Infraestructura"),
    ("units", "unidades"),
    ("damaged", "dañado"),
    ("priority", "Prioridad"),
    ("populationImpact", "Impacto Poblacional"),
    ("affected", "Afectados"),
    ("displaced", "Desplazados"),
    ("vulnerable", "Vulnerables"),
    ("vulnerabilityMap", "Mapa de Vulnerabilidad Poblacional"),
    ("layers", "Capas"),
    ("riskLevel", "Nivel de Riesgo"),
    ("high", "Alto"),
    ("medium", "Medio"),
    ("low", "Bajo"),
    ("highRiskZones", "Riesgo Alto"),
    ("mediumRiskZones", "Riesgo Medio"),
    ("lowRiskZones", "Riesgo Bajo"),
    ("coverage", "Cobertura"),
    ("aiAssistant", "Asistente Multilingüe GPT"),
    ("welcomeMessage", "¡Hola! Puedo ayudarte con operaciones de respuesta a desastres. Pregúntame sobre rutas de evacuación, ubicaciones de refugios o asignación de recursos."),
    ("quickQuestions", "Preguntas Rápidas"),
    ("quickQuestion1", "¿Rutas de evacuación?"),
    ("quickQuestion2", "¿Refugio más cercano?"),
    ("quickQuestion3", "¿Instalaciones médicas?"),
    ("quickQuestion4", "¿Distribución de suministros?"),
    ("typeMessage", "Escribe tu mensaje..."),
    ("downloadReports", "Generar Reportes"),
    ("disasterReport", "Evaluación Terremoto Haití"),
    ("completed", "Completado"),
    ("selectFormats", "Seleccionar Formatos de Exportación"),
    ("download", "Descargar Paquete"),
    ("share", "Compartir Reporte"),
];

const FR: Table = &[
    ("uploadImages", "Télécharger Images Satellitaires"),
    ("dragDropImages", "Glissez et déposez les images ici"),
    ("supportedFormats", "Supporte les formats JPEG, PNG, TIFF"),
    ("selectFiles", "Sélectionner Fichiers"),
    ("useSampleData", "Utiliser Données Échantillon"),
    ("availableSamples", "Données Échantillon Disponibles"),
    ("ganEnhancement", "Amélioration Image GAN"),
    ("aiAssistant", "Assistant Multilingue GPT"),
    ("welcomeMessage", "Bonjour! Je peux vous aider avec les opérations de réponse aux catastrophes."),
    ("downloadReports", "Générer Rapports"),
    ("download", "Télécharger Package"),
    ("share", "Partager Rapport"),
];

const HT: Table = &[
    ("uploadImages", "Uploade Imaj Satelit yo"),
    ("dragDropImages", "Deplase ak lage imaj yo isit la"),
    ("useSampleData", "Sèvi ak Done Egzanp"),
    ("ganEnhancement", "Amelyorasyon Imaj GAN"),
    ("aiAssistant", "Asistan Multilingue GPT"),
    ("welcomeMessage", "Bonjou! Mwen ka ede w ak operasyon reponn nan katastwòf yo."),
    ("downloadReports", "Jenere Rapò yo"),
    ("download", "Telechaje Package"),
    ("share", "Pataje Rapò"),
];

const AR: Table = &[
    ("uploadImages", "تحميل صور الأقمار الصناعية"),
    ("dragDropImages", "اسحب وأفلت الصور هنا"),
    ("useSampleData", "استخدام بيانات عينة"),
    ("ganEnhancement", "تحسين صورة GAN"),
    ("aiAssistant", "مساعد GPT متعدد اللغات"),
    ("welcomeMessage", "مرحباً! يمكنني مساعدتك في عمليات الاستجابة للكوارث."),
    ("downloadReports", "إنشاء التقارير"),
    ("download", "تحميل الحزمة"),
    ("share", "مشاركة التقرير"),
];

const ZH: Table = &[
    ("uploadImages", "上传卫星图像"),
    ("dragDropImages", "拖拽图片到这里"),
    ("useSampleData", "使用示例数据"),
    ("ganEnhancement", "GAN图像增强"),
    ("aiAssistant", "GPT多语言助手"),
    ("welcomeMessage", "您好！我可以帮助您进行灾害响应操作。"),
    ("downloadReports", "生成报告"),
    ("download", "下载包"),
    ("share", "分享报告"),
];
