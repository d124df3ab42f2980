//! Framework stub registry.
//!
//! Emitted modules reference a domain framework (algorithm base classes,
//! capability enums) whose real implementation ships separately. The
//! transformer records every referenced name; at emission each name resolves
//! through this static table to a minimal declaration so the output file is
//! independently loadable.

use recast_core::options::Dialect;

/// Framework names the transformer watches for in superclass positions and
/// bare identifier references.
pub const FRAMEWORK_TYPES: &[&str] = &[
    "AlgorithmFramework",
    "BlockCipherAlgorithm",
    "StreamCipherAlgorithm",
    "HashFunctionAlgorithm",
    "MacAlgorithm",
    "KdfAlgorithm",
    "IBlockCipherInstance",
    "IHashFunctionInstance",
    "KeySize",
    "LinkItem",
    "TestCase",
    "Vulnerability",
    "CategoryType",
    "SecurityStatus",
    "ComplexityType",
    "CountryCode",
];

pub fn is_framework_type(name: &str) -> bool {
    FRAMEWORK_TYPES.contains(&name)
}

/// Resolve one referenced framework name to its Python stub block, or `None`
/// for names that need no declaration.
pub fn python_stub(name: &str) -> Option<&'static str> {
    Some(match name {
        "AlgorithmFramework" => {
            "class AlgorithmFramework:\n    @staticmethod\n    def register_algorithm(algorithm):\n        pass"
        }
        "BlockCipherAlgorithm" | "StreamCipherAlgorithm" | "HashFunctionAlgorithm"
        | "MacAlgorithm" | "KdfAlgorithm" | "IBlockCipherInstance" | "IHashFunctionInstance" => {
            // One shared shape; the emitter substitutes the class name.
            "class {name}:\n    def __init__(self, *args):\n        pass"
        }
        "KeySize" => {
            "class KeySize:\n    def __init__(self, min_size, max_size, step):\n        self.min_size = min_size\n        self.max_size = max_size\n        self.step = step"
        }
        "LinkItem" => {
            "class LinkItem:\n    def __init__(self, text, uri):\n        self.text = text\n        self.uri = uri"
        }
        "TestCase" => {
            "class TestCase:\n    def __init__(self, input_data, expected, text=None, uri=None):\n        self.input = input_data\n        self.expected = expected\n        self.text = text\n        self.uri = uri"
        }
        "Vulnerability" => {
            "class Vulnerability:\n    def __init__(self, kind, text):\n        self.kind = kind\n        self.text = text"
        }
        "CategoryType" => {
            "class CategoryType:\n    BLOCK = \"block\"\n    STREAM = \"stream\"\n    HASH = \"hash\"\n    MAC = \"mac\"\n    KDF = \"kdf\"\n    ASYMMETRIC = \"asymmetric\"\n    CLASSICAL = \"classical\"\n    CHECKSUM = \"checksum\""
        }
        "SecurityStatus" => {
            "class SecurityStatus:\n    SECURE = \"secure\"\n    EDUCATIONAL = \"educational\"\n    INSECURE = \"insecure\"\n    DEPRECATED = \"deprecated\"\n    EXPERIMENTAL = \"experimental\""
        }
        "ComplexityType" => {
            "class ComplexityType:\n    BEGINNER = \"beginner\"\n    INTERMEDIATE = \"intermediate\"\n    ADVANCED = \"advanced\"\n    EXPERT = \"expert\""
        }
        "CountryCode" => {
            "class CountryCode:\n    US = \"US\"\n    DE = \"DE\"\n    GB = \"GB\"\n    JP = \"JP\"\n    INTL = \"INTL\""
        }
        _ => return None,
    })
}

/// Resolve one referenced framework name to its BASIC stub block.
pub fn basic_stub(name: &str, dialect: Dialect) -> Option<String> {
    let _ = dialect;
    Some(match name {
        "AlgorithmFramework" => concat!(
            "Class AlgorithmFramework\n",
            "    Public Shared Sub RegisterAlgorithm(algorithm As Object)\n",
            "    End Sub\n",
            "End Class"
        )
        .to_string(),
        "BlockCipherAlgorithm" | "StreamCipherAlgorithm" | "HashFunctionAlgorithm"
        | "MacAlgorithm" | "KdfAlgorithm" | "IBlockCipherInstance" | "IHashFunctionInstance" => {
            format!("Class {}\nEnd Class", name)
        }
        "KeySize" => concat!(
            "Class KeySize\n",
            "    Public MinSize As Integer\n",
            "    Public MaxSize As Integer\n",
            "    Public StepSize As Integer\n",
            "End Class"
        )
        .to_string(),
        "LinkItem" => concat!(
            "Class LinkItem\n",
            "    Public Text As String\n",
            "    Public Uri As String\n",
            "End Class"
        )
        .to_string(),
        "TestCase" => concat!(
            "Class TestCase\n",
            "    Public Input As Byte()\n",
            "    Public Expected As Byte()\n",
            "End Class"
        )
        .to_string(),
        "Vulnerability" => concat!(
            "Class Vulnerability\n",
            "    Public Kind As String\n",
            "    Public Text As String\n",
            "End Class"
        )
        .to_string(),
        "CategoryType" => concat!(
            "Enum CategoryType\n",
            "    BLOCK\n",
            "    STREAM\n",
            "    HASH\n",
            "    MAC\n",
            "    KDF\n",
            "    ASYMMETRIC\n",
            "    CLASSICAL\n",
            "    CHECKSUM\n",
            "End Enum"
        )
        .to_string(),
        "SecurityStatus" => concat!(
            "Enum SecurityStatus\n",
            "    SECURE\n",
            "    EDUCATIONAL\n",
            "    INSECURE\n",
            "    DEPRECATED\n",
            "    EXPERIMENTAL\n",
            "End Enum"
        )
        .to_string(),
        "ComplexityType" => concat!(
            "Enum ComplexityType\n",
            "    BEGINNER\n",
            "    INTERMEDIATE\n",
            "    ADVANCED\n",
            "    EXPERT\n",
            "End Enum"
        )
        .to_string(),
        "CountryCode" => concat!(
            "Enum CountryCode\n",
            "    US\n",
            "    DE\n",
            "    GB\n",
            "    JP\n",
            "    INTL\n",
            "End Enum"
        )
        .to_string(),
        _ => return None,
    })
}

/// Render the Python stub for `name`, substituting the shared-shape
/// placeholder where the table uses one.
pub fn render_python_stub(name: &str) -> Option<String> {
    python_stub(name).map(|stub| stub.replace("{name}", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn framework_bases_resolve() {
        let stub = render_python_stub("BlockCipherAlgorithm").expect("stub");
        assert!(stub.starts_with("class BlockCipherAlgorithm:"));
    }

    #[test]
    fn enums_resolve_to_value_tables() {
        let stub = render_python_stub("CategoryType").expect("stub");
        assert!(stub.contains("BLOCK = \"block\""));
    }

    #[test]
    fn non_framework_names_resolve_to_none() {
        assert!(render_python_stub("Rijndael").is_none());
        assert!(!is_framework_type("Rijndael"));
    }
}
